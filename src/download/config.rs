//!
//! 配置模块
//!

use std::fs;
use std::num::NonZeroU8;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_URI: &str = "https://www.example.com/";
const APP_DIR: &str = "segment-downloader";
const CONFIG_FILE: &str = "config.json";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Number of segments fetched in parallel.
    pub concurrency: NonZeroU8,
    pub download_dir: PathBuf,
    pub user_agent: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn load_from_file(file_path: &Path) -> Result<Self> {
        let config_data = fs::read_to_string(file_path)
            .with_context(|| format!("Read config failed: {}", file_path.display()))?;
        let config: Config = serde_json::from_str(&config_data)
            .with_context(|| format!("Parse config failed: {}", file_path.display()))?;

        Ok(config)
    }

    /// Loads `path`, else the default config file if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => match default_config_path().filter(|path| path.exists()) {
                Some(path) => Self::load_from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: NonZeroU8::new(3).unwrap_or(NonZeroU8::MIN),
            download_dir: PathBuf::from("."),
            user_agent: None,
            connect_timeout_secs: None,
            read_timeout_secs: None,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// `<config dir>/segment-downloader/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn should_default_to_three_segments_in_working_dir() {
        let config = Config::default();

        assert_eq!(config.concurrency.get(), 3);
        assert_eq!(config.download_dir, PathBuf::from("."));
        assert!(config.connect_timeout_secs.is_none());
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn should_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "concurrency": 8, "log_level": "debug" }}"#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.concurrency.get(), 8);
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
        assert_eq!(config.download_dir, PathBuf::from("."));
    }

    #[test]
    fn should_reject_zero_concurrency() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "concurrency": 0 }}"#).unwrap();

        assert!(Config::load_from_file(file.path()).is_err());
    }
}
