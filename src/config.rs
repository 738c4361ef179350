//! Server configuration
//!
//! Settings come from an optional TOML file; anything not set there falls
//! back to defaults, and the CLI flags in `main.rs` override both.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Where decks and cards are stored
    pub data_dir: PathBuf,
    /// Address the HTTP server listens on
    pub bind: SocketAddr,
}

/// On-disk shape of the config file; every field optional
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    bind: Option<SocketAddr>,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7151))
}

impl ServerConfig {
    /// Get the default data directory (e.g. ~/.local/share/studybox)
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("studybox"))
            .ok_or(ConfigError::DataDirNotFound)
    }

    /// Load configuration from the given file, or from `studybox.toml` in
    /// the default data directory. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let data_dir = Self::default_data_dir()?;
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => data_dir.join("studybox.toml"),
        };

        let file = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str::<ConfigFile>(&content)?
        } else {
            ConfigFile::default()
        };

        Ok(Self {
            data_dir: file.data_dir.unwrap_or(data_dir),
            bind: file.bind.unwrap_or_else(default_bind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_file() {
        let file: ConfigFile = toml::from_str(
            r#"
            data_dir = "/tmp/studybox-test"
            bind = "0.0.0.0:8080"
            "#,
        )
        .unwrap();

        assert_eq!(file.data_dir, Some(PathBuf::from("/tmp/studybox-test")));
        assert_eq!(file.bind, Some("0.0.0.0:8080".parse().unwrap()));
    }

    #[test]
    fn test_empty_config_file_is_valid() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert!(file.data_dir.is_none());
        assert!(file.bind.is_none());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ServerConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();

        assert_eq!(config.bind, default_bind());
    }

    #[test]
    fn test_load_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("studybox.toml");
        fs::write(&path, "bind = \"127.0.0.1:9000\"\n").unwrap();

        let config = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.bind, "127.0.0.1:9000".parse().unwrap());
    }
}
