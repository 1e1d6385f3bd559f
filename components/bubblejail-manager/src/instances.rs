//! On-disk instance store.
//!
//! Every data directory holds an `instances/` directory with one
//! sub-directory per instance. An instance may carry `metadata_v1.toml` with
//! a `desktop_entry_name` key.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Colon separated list of data directories, replacing the XDG default.
pub const DATA_DIRS_ENV: &str = "BUBBLEJAIL_DATADIRS";
const INSTANCES_DIR: &str = "instances";
const METADATA_FILE: &str = "metadata_v1.toml";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot locate the XDG data directory: {0}")]
    Xdg(#[from] xdg::BaseDirectoriesError),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    desktop_entry_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InstanceStore {
    data_dirs: Vec<PathBuf>,
}

impl InstanceStore {
    pub fn new(data_dirs: Vec<PathBuf>) -> Self {
        Self { data_dirs }
    }

    /// `$BUBBLEJAIL_DATADIRS` when set, `$XDG_DATA_HOME/bubblejail` otherwise.
    pub fn from_env() -> Result<Self, StoreError> {
        if let Ok(dirs) = std::env::var(DATA_DIRS_ENV) {
            return Ok(Self::new(dirs.split(':').map(PathBuf::from).collect()));
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("bubblejail")?;
        Ok(Self::new(vec![xdg_dirs.get_data_home()]))
    }

    pub fn data_dirs(&self) -> &[PathBuf] {
        &self.data_dirs
    }

    /// `(instance_name, desktop_entry_name)` pairs; the entry is `""` when
    /// the instance has none. Data directories keep their order, instances
    /// are sorted by name within each of them.
    pub fn list_with_desktop_entries(&self) -> Result<Vec<(String, String)>, StoreError> {
        let mut instances = Vec::new();
        for data_dir in &self.data_dirs {
            for instance_dir in instance_dirs(&data_dir.join(INSTANCES_DIR))? {
                let Some(name) = instance_dir.file_name().and_then(|name| name.to_str()) else {
                    warn!(path = %instance_dir.display(), "Skipping instance with a non UTF-8 name");
                    continue;
                };
                let desktop_entry = desktop_entry_name(&instance_dir).unwrap_or_default();
                instances.push((name.to_string(), desktop_entry));
            }
        }
        debug!(count = instances.len(), "Listed instances");
        Ok(instances)
    }
}

fn instance_dirs(instances_dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let read_dir = match fs::read_dir(instances_dir) {
        Ok(read_dir) => read_dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %instances_dir.display(), "No instances directory");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: instances_dir.to_path_buf(),
                source,
            })
        }
    };

    let mut dirs: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn desktop_entry_name(instance_dir: &Path) -> Option<String> {
    let path = instance_dir.join(METADATA_FILE);
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str::<Metadata>(&content) {
        Ok(metadata) => metadata.desktop_entry_name,
        Err(err) => {
            warn!(path = %path.display(), "Ignoring unreadable instance metadata: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(data_dir: &Path, name: &str, metadata: Option<&str>) {
        let dir = data_dir.join(INSTANCES_DIR).join(name);
        fs::create_dir_all(&dir).unwrap();
        if let Some(metadata) = metadata {
            fs::write(dir.join(METADATA_FILE), metadata).unwrap();
        }
    }

    #[test]
    fn lists_instances_with_their_desktop_entries() {
        let data = tempfile::tempdir().unwrap();
        instance(data.path(), "steam", None);
        instance(
            data.path(),
            "code",
            Some("desktop_entry_name = \"code.desktop\"\ncreation_profile_name = \"vscode\"\n"),
        );
        instance(data.path(), "broken", Some("desktop_entry_name = "));

        let store = InstanceStore::new(vec![data.path().to_path_buf()]);

        assert_eq!(
            store.list_with_desktop_entries().unwrap(),
            vec![
                ("broken".to_string(), String::new()),
                ("code".to_string(), "code.desktop".to_string()),
                ("steam".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn data_dirs_keep_their_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        instance(first.path(), "zeta", None);
        instance(second.path(), "alpha", None);

        let store = InstanceStore::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        let names: Vec<String> = store
            .list_with_desktop_entries()
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        assert_eq!(names, vec!["zeta".to_string(), "alpha".to_string()]);
    }

    #[test]
    fn missing_instances_dir_is_empty() {
        let data = tempfile::tempdir().unwrap();
        let store = InstanceStore::new(vec![data.path().join("nowhere")]);
        assert!(store.list_with_desktop_entries().unwrap().is_empty());
    }

    #[test]
    fn stray_files_are_not_instances() {
        let data = tempfile::tempdir().unwrap();
        instance(data.path(), "code", None);
        fs::write(data.path().join(INSTANCES_DIR).join("notes.txt"), "x").unwrap();

        let store = InstanceStore::new(vec![data.path().to_path_buf()]);
        assert_eq!(store.list_with_desktop_entries().unwrap().len(), 1);
    }
}
