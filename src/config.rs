//! TOML configuration.
//!
//! Every section is optional; missing values fall back to the built-in
//! defaults, so running without a config file behaves exactly like an
//! empty one. Command-line flags override whatever is loaded here.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::timestamp::{TimestampNormalizer, DEFAULT_TIMEZONE};

/// Chat identifier used when none is given.
pub const DEFAULT_CHAT_ID: &str = "Ocheret";
/// Store location used when none is given.
pub const DEFAULT_DB_PATH: &str = "./data/data.db";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_chat_id")]
    pub chat_id: String,
    /// IANA zone the export headers are written in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// How many warnings `import` prints before summarising the rest.
    #[serde(default = "default_warnings_limit")]
    pub warnings_limit: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chat_id: default_chat_id(),
            timezone: default_timezone(),
            warnings_limit: default_warnings_limit(),
        }
    }
}

fn default_chat_id() -> String {
    DEFAULT_CHAT_ID.to_string()
}
fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}
fn default_warnings_limit() -> usize {
    20
}

impl Config {
    pub fn normalizer(&self) -> Result<TimestampNormalizer> {
        TimestampNormalizer::from_name(&self.ingest.timezone)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest.chat_id.trim().is_empty() {
            bail!("ingest.chat_id must not be empty");
        }
        if self.ingest.warnings_limit == 0 {
            bail!("ingest.warnings_limit must be >= 1");
        }
        if self.db.path.as_os_str().is_empty() {
            bail!("db.path must not be empty");
        }
        self.normalizer()
            .with_context(|| format!("Invalid ingest.timezone '{}'", self.ingest.timezone))?;
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

/// Load `path` if it was given explicitly or exists; otherwise defaults.
pub fn load_or_default(path: &Path, explicit: bool) -> Result<Config> {
    if explicit || path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.db.path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(cfg.ingest.chat_id, DEFAULT_CHAT_ID);
        assert_eq!(cfg.ingest.timezone, "Europe/Kyiv");
        assert_eq!(cfg.ingest.warnings_limit, 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("intercepts.toml");
        fs::write(&path, "[ingest]\nchat_id = \"Delta\"\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.ingest.chat_id, "Delta");
        assert_eq!(cfg.ingest.timezone, "Europe/Kyiv");
        assert_eq!(cfg.db.path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("intercepts.toml");
        fs::write(&path, "[ingest]\ntimezone = \"Nowhere/Atlantis\"\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_rejects_zero_warnings_limit() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("intercepts.toml");
        fs::write(&path, "[ingest]\nwarnings_limit = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_default_file_falls_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.toml");
        assert!(load_or_default(&path, false).is_ok());
        assert!(load_or_default(&path, true).is_err());
    }
}
