use std::path::{Path, PathBuf};
use std::{fs, io};

use scanner::ScanConfig;
use serde::Deserialize;

/// Overrides the config file location
pub const CONFIG_ENV: &str = "MCD_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Compare fuzzy tokens against directory names case-insensitively
    pub ignore_case: bool,

    /// How deep the subtree search may go below each searched directory
    pub max_depth: Option<usize>,

    /// Treat symlinks to directories as directories
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignore_case: false,
            max_depth: None,
            follow_symlinks: true,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|dir| dir.join("mcd").join("mcd.toml")))
}

impl Config {
    /// Loads the user's config, falling back to defaults when there is none
    /// or when it cannot be used.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };

        match Self::from_file(&path) {
            Ok(Some(config)) => {
                debug!("Loaded config from '{}'", path.display());
                config
            },
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("{e}; using defaults");
                Self::default()
            },
        }
    }

    /// Reads a config file. A missing file is `Ok(None)`.
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            },
        };

        toml::from_str(&contents)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            follow_symlinks: self.follow_symlinks,
            max_depth: self.max_depth,
        }
    }
}
