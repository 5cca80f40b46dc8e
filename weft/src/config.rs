use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_FILENAME, DEFAULT_SHADOW_PREFIX};

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The `[weft]` section.
    pub weft: WeftConfig,
    /// The path to the configuration file this was loaded from.
    /// Set during `load_from_path`, `None` if using defaults or programmatic config.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "kebab-case")]
/// Configuration options for the pre-processor.
pub struct WeftConfig {
    /// Prefix stripped from `@Shadow` members (default `shadow$`).
    pub prefix: Option<String>,
    /// Fail instead of discarding colliding public `@Unique` members.
    #[serde(alias = "strict_unique")]
    pub strict_unique: Option<bool>,
    /// Extra diagnostics: unique renames and `@Final` mismatches.
    pub verbose: Option<bool>,
    /// Mapping table used for remapped lookups.
    pub mappings: Option<PathBuf>,
}

/// Resolved options handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeaveOptions {
    /// Default shadow prefix.
    pub shadow_prefix: String,
    /// Whether colliding public unique members are fatal.
    pub strict_unique: bool,
    /// Extra diagnostics.
    pub verbose: bool,
}

impl Default for WeaveOptions {
    fn default() -> Self {
        Self {
            shadow_prefix: DEFAULT_SHADOW_PREFIX.to_owned(),
            strict_unique: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from_path(Path::new("."))
    }

    /// Loads configuration starting from a specific path and traversing up.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            let weft_toml = current.join(CONFIG_FILENAME);
            if weft_toml.exists() {
                if let Ok(content) = fs::read_to_string(&weft_toml) {
                    match toml::from_str::<Config>(&content) {
                        Ok(mut config) => {
                            config.config_file_path = Some(weft_toml);
                            return config;
                        }
                        Err(e) => {
                            tracing::warn!(path = %weft_toml.display(), "ignoring malformed config: {e}");
                        }
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        Config::default()
    }

    /// Resolves file values into engine options.
    #[must_use]
    pub fn options(&self) -> WeaveOptions {
        let defaults = WeaveOptions::default();
        WeaveOptions {
            shadow_prefix: self.weft.prefix.clone().unwrap_or(defaults.shadow_prefix),
            strict_unique: self.weft.strict_unique.unwrap_or(defaults.strict_unique),
            verbose: self.weft.verbose.unwrap_or(defaults.verbose),
        }
    }

    /// Mapping table path, resolved against the config file's directory.
    #[must_use]
    pub fn mappings_path(&self) -> Option<PathBuf> {
        let mappings = self.weft.mappings.as_ref()?;
        if mappings.is_absolute() {
            return Some(mappings.clone());
        }
        let base = self.config_file_path.as_ref().and_then(|p| p.parent());
        Some(base.map_or_else(|| mappings.clone(), |dir| dir.join(mappings)))
    }
}
