//! Icon lookup through installed desktop entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use freedesktop_desktop_entry::{DesktopEntry, Iter as DesktopEntryIter};
use tracing::{debug, warn};

/// Generic icon for an instance without a usable desktop entry.
pub const DEFAULT_ICON: &str = "application-x-executable";

/// Maps a desktop entry identifier to an icon name.
pub trait IconResolver {
    /// Loads what [`IconResolver::icon_for_entry`] needs for these entries.
    ///
    /// Runs before a list is presented; lookups afterwards stay in memory.
    fn prepare(&mut self, _desktop_entries: &[&str]) {}

    fn icon_for_entry(&self, desktop_entry: &str) -> Option<String>;
}

/// Reads the `Icon=` key of installed `.desktop` files.
pub struct DesktopEntryIcons {
    locales: Vec<String>,
    search_dirs: Vec<PathBuf>,
    icons: HashMap<String, String>,
}

impl DesktopEntryIcons {
    /// Searches the XDG application directories.
    pub fn new(locales: Vec<String>) -> Self {
        Self::with_search_dirs(locales, application_dirs())
    }

    pub fn with_search_dirs(locales: Vec<String>, search_dirs: Vec<PathBuf>) -> Self {
        Self {
            locales,
            search_dirs,
            icons: HashMap::new(),
        }
    }

    fn read_icon(&self, desktop_entry: &str) -> Option<String> {
        let path = find_desktop_entry(&self.search_dirs, desktop_entry)?;
        let locales: Vec<&str> = self.locales.iter().map(String::as_str).collect();
        let entry = DesktopEntry::from_path(path, Some(locales.as_slice())).ok()?;
        entry.icon().map(str::to_string)
    }
}

impl IconResolver for DesktopEntryIcons {
    fn prepare(&mut self, desktop_entries: &[&str]) {
        self.icons.clear();
        for &desktop_entry in desktop_entries {
            let icon = self.read_icon(desktop_entry);
            debug!(desktop_entry, ?icon, "Resolved desktop entry icon");
            if let Some(icon) = icon {
                self.icons.insert(desktop_entry.to_string(), icon);
            }
        }
    }

    fn icon_for_entry(&self, desktop_entry: &str) -> Option<String> {
        self.icons.get(desktop_entry).cloned()
    }
}

/// `applications/` under `$XDG_DATA_HOME` and every `$XDG_DATA_DIRS` entry.
///
/// Empty when the base directories cannot be determined, e.g. without `HOME`.
pub fn application_dirs() -> Vec<PathBuf> {
    match xdg::BaseDirectories::new() {
        Ok(base_dirs) => std::iter::once(base_dirs.get_data_home())
            .chain(base_dirs.get_data_dirs())
            .map(|dir| dir.join("applications"))
            .collect(),
        Err(err) => {
            warn!(%err, "Cannot locate XDG data directories, desktop entries are not searched");
            Vec::new()
        }
    }
}

/// Locates a desktop entry file.
///
/// Identifiers containing a `/` are paths; anything else is a file name in
/// `search_dirs`, with or without the `.desktop` suffix. File names match
/// exactly.
pub fn find_desktop_entry(search_dirs: &[PathBuf], desktop_entry: &str) -> Option<PathBuf> {
    if desktop_entry.contains('/') {
        let path = PathBuf::from(desktop_entry);
        return path.is_file().then_some(path);
    }

    let file_name = if desktop_entry.ends_with(".desktop") {
        desktop_entry.to_string()
    } else {
        format!("{desktop_entry}.desktop")
    };

    DesktopEntryIter::new(search_dirs.iter().cloned()).find(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == file_name)
    })
}

/// Icon name guessed from the entry identifier itself: `code.desktop` → `code`.
pub fn icon_from_entry_id(desktop_entry: &str) -> Option<String> {
    Path::new(desktop_entry)
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.strip_suffix(".desktop").unwrap_or(name))
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}
