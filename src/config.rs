// src/config.rs
use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use toml;

use crate::models::MatchPolicy;
use crate::store::{self, RecordStore, STORE_FILENAME, TEMP_FILENAME};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Record file. Relative paths resolve against the working directory.
    pub store_file: PathBuf,
    /// Rewrite scratch file. Relative paths resolve next to `store_file`.
    pub temp_file: PathBuf,
    pub match_policy: MatchPolicy,
    pub default_length: i64,
    pub max_password_len: usize,
    pub max_label_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_file: PathBuf::from(STORE_FILENAME),
            temp_file: PathBuf::from(TEMP_FILENAME),
            match_policy: MatchPolicy::Line,
            default_length: 16,
            max_password_len: 255,
            max_label_len: 99,
        }
    }
}

impl Config {
    /// Opens the record store this configuration describes.
    /// A `temp_file` that resolves to `store_file` is moved aside.
    pub fn open_store(&self) -> RecordStore {
        RecordStore::new(&self.store_file)
            .with_temp_path(store::temp_path_beside(&self.store_file, &self.temp_file))
            .with_match_policy(self.match_policy)
    }

    /// Writes this configuration as TOML, creating missing parent directories.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let body = toml::to_string_pretty(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, body)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "PassCheck", "PassCheck").map(|proj_dirs| {
        let config_dir = proj_dirs.config_dir();
        config_dir.join("passcheck_config.toml")
    })
}

/// Loads the configuration from `path`, or from the platform config directory.
/// Never fails: anything unreadable falls back to defaults with a warning.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => {
                warn!("Could not determine config directory. Using default configuration.");
                return Config::default();
            }
        },
    };
    load_config_from(&config_path)
}

fn load_config_from(config_path: &Path) -> Config {
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let config = Config::default();
            match config.write_to(config_path) {
                Ok(()) => info!("Wrote default configuration to {:?}", config_path),
                Err(e) => warn!("Could not write default configuration to {:?}: {}", config_path, e),
            }
            return config;
        }
        Err(e) => {
            warn!("Cannot read config {:?}: {}. Using defaults.", config_path, e);
            return Config::default();
        }
    };

    toml::from_str(&content).unwrap_or_else(|e| {
        warn!("Cannot parse config {:?}: {}. Using defaults.", config_path, e);
        Config::default()
    })
}
