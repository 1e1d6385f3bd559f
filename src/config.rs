use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::icons::DEFAULT_ICON;

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "bubblejail_config.toml";
/// Environment variable naming an extra configuration file.
pub const CONFIG_ENV: &str = "BUBBLEJAIL_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Locales used when reading desktop entries.
    pub locales: Vec<String>,
    /// Icon shown for instances without a desktop entry.
    pub fallback_icon: String,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

impl Default for Config {
    fn default() -> Self {
        Self {
            locales: vec!["en".to_string()],
            fallback_icon: DEFAULT_ICON.to_string(),
        }
    }
}

impl Config {
    pub fn with<R>(f: impl FnOnce(&Config) -> R) -> R {
        let config = CONFIG.get_or_init(Config::init);
        f(config)
    }

    fn init() -> Self {
        let mut sources = vec![CONFIG_FILE.to_string()];
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            sources.push(path);
        }

        let overrides: Vec<String> = sources
            .iter()
            .filter_map(|path| std::fs::read_to_string(path).ok())
            .collect();
        Self::from_toml_layers(overrides.iter().map(String::as_str))
    }

    /// Defaults with a single TOML document merged on top.
    pub fn from_toml_str(content: &str) -> Self {
        Self::from_toml_layers([content])
    }

    /// Defaults with each TOML document merged on top, in order.
    ///
    /// Layers that do not parse are skipped; a merged result that does not fit
    /// the schema falls back to the defaults.
    pub fn from_toml_layers<'a>(layers: impl IntoIterator<Item = &'a str>) -> Self {
        let Ok(mut merged) = toml::Value::try_from(Self::default()) else {
            return Self::default();
        };

        for content in layers {
            match content.parse::<toml::Value>() {
                Ok(value) => overlay(&mut merged, value),
                Err(err) => warn!("Failed to parse configuration: {err}"),
            }
        }

        merged.try_into().unwrap_or_else(|err| {
            warn!("Falling back to default config due to invalid overrides: {err}");
            Self::default()
        })
    }
}

/// Lays `layer` over `base`: tables combine key by key, any other value
/// replaces what was there.
fn overlay(base: &mut toml::Value, layer: toml::Value) {
    let layer = match layer {
        toml::Value::Table(layer) => layer,
        other => {
            *base = other;
            return;
        }
    };
    let Some(table) = base.as_table_mut() else {
        *base = toml::Value::Table(layer);
        return;
    };
    for (key, value) in layer {
        match table.get_mut(&key) {
            Some(slot) => overlay(slot, value),
            None => {
                table.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_keeps_defaults() {
        assert_eq!(Config::from_toml_str(""), Config::default());
    }

    #[test]
    fn keys_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            locales = ["de", "en"]
            fallback_icon = "dialog-question"
            "#,
        );

        assert_eq!(config.locales, vec!["de".to_string(), "en".to_string()]);
        assert_eq!(config.fallback_icon, "dialog-question");
    }

    #[test]
    fn later_layers_win() {
        let config = Config::from_toml_layers([
            "fallback_icon = \"first\"",
            "not valid toml = = =",
            "fallback_icon = \"second\"",
        ]);
        assert_eq!(config.fallback_icon, "second");
        assert_eq!(config.locales, vec!["en".to_string()]);
    }

    #[test]
    fn nested_tables_combine() {
        let mut base: toml::Value = "[icons]\nfallback = \"a\"\nsize = 16\n".parse().unwrap();
        overlay(&mut base, "[icons]\nsize = 32\n".parse().unwrap());

        assert_eq!(base["icons"]["fallback"].as_str(), Some("a"));
        assert_eq!(base["icons"]["size"].as_integer(), Some(32));
    }

    #[test]
    fn wrong_types_fall_back_to_defaults() {
        let config = Config::from_toml_str("locales = 3");
        assert_eq!(config, Config::default());
    }
}
