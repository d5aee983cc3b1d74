//! Application configuration: an optional TOML file plus `CLASS_SCHEDULE_*`
//! environment overrides.

use crate::persistence::{FileStore, KeyValueStore, MemoryStore, PersistenceError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_PATH_ENV: &str = "CLASS_SCHEDULE_CONFIG";
pub const DATA_DIR_ENV: &str = "CLASS_SCHEDULE_DATA_DIR";
pub const STORE_ENV: &str = "CLASS_SCHEDULE_STORE";
pub const LOG_LEVEL_ENV: &str = "CLASS_SCHEDULE_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "CLASS_SCHEDULE_LOG_DIR";
pub const HTTP_ADDR_ENV: &str = "CLASS_SCHEDULE_HTTP_ADDR";

const APP_DIR_NAME: &str = "class-schedule";
#[cfg(feature = "sqlite")]
const SQLITE_FILE_NAME: &str = "schedules.db";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown store kind `{0}`; expected file|sqlite|memory")]
    UnknownStore(String),
    #[error("store kind `{0}` is not available in this build")]
    StoreUnavailable(StoreKind),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    File,
    Sqlite,
    Memory,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StoreKind::File => "file",
            StoreKind::Sqlite => "sqlite",
            StoreKind::Memory => "memory",
        };
        f.write_str(label)
    }
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreKind::File),
            "sqlite" => Ok(StoreKind::Sqlite),
            "memory" => Ok(StoreKind::Memory),
            other => Err(ConfigError::UnknownStore(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the persisted schedules.
    pub data_dir: PathBuf,
    pub store: StoreKind,
    pub log_level: String,
    /// Rotated log files go here; stderr when unset.
    pub log_dir: Option<PathBuf>,
    pub http_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store: StoreKind::default(),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            http_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// `dirs::data_dir()/class-schedule`, or a temp-dir fallback.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| std::env::temp_dir().join(APP_DIR_NAME))
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Loads using `lookup` in place of the process environment.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = match non_empty(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(path.trim()))?,
            None => Self::default(),
        };
        if let Some(dir) = non_empty(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(kind) = non_empty(STORE_ENV) {
            config.store = kind.parse()?;
        }
        if let Some(level) = non_empty(LOG_LEVEL_ENV) {
            config.log_level = level;
        }
        if let Some(dir) = non_empty(LOG_DIR_ENV) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(addr) = non_empty(HTTP_ADDR_ENV) {
            config.http_addr = addr;
        }
        Ok(config)
    }

    /// Builds the configured backing store.
    pub fn open_store(&self) -> Result<Box<dyn KeyValueStore>, ConfigError> {
        match self.store {
            StoreKind::File => Ok(Box::new(FileStore::new(&self.data_dir)?)),
            StoreKind::Memory => Ok(Box::new(MemoryStore::new())),
            #[cfg(feature = "sqlite")]
            StoreKind::Sqlite => {
                std::fs::create_dir_all(&self.data_dir).map_err(PersistenceError::from)?;
                let store =
                    crate::persistence::sqlite::SqliteStore::new(self.data_dir.join(SQLITE_FILE_NAME))?;
                Ok(Box::new(store))
            }
            #[cfg(not(feature = "sqlite"))]
            StoreKind::Sqlite => Err(ConfigError::StoreUnavailable(StoreKind::Sqlite)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::load_with(env(&[])).unwrap();
        assert_eq!(config.store, StoreKind::File);
        assert!(config.data_dir.ends_with(APP_DIR_NAME));
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn environment_overrides_file_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "store = \"memory\"\nlog_level = \"warn\"\nhttp_addr = \"0.0.0.0:9000\"\n",
        )
        .unwrap();

        let config = AppConfig::load_with(env(&[
            (CONFIG_PATH_ENV, path.to_str().unwrap()),
            (LOG_LEVEL_ENV, "error"),
            (DATA_DIR_ENV, "/srv/schedules"),
        ]))
        .unwrap();
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.log_level, "error");
        assert_eq!(config.http_addr, "0.0.0.0:9000");
        assert_eq!(config.data_dir, PathBuf::from("/srv/schedules"));
    }

    #[test]
    fn rejects_unknown_store_kind() {
        let err = AppConfig::load_with(env(&[(STORE_ENV, "redis")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStore(kind) if kind == "redis"));
    }

    #[test]
    fn reports_malformed_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "store = [").unwrap();
        let err = AppConfig::load_with(env(&[(CONFIG_PATH_ENV, path.to_str().unwrap())]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn file_store_lands_in_data_dir() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().join("data"),
            ..AppConfig::default()
        };
        let mut store = config.open_store().unwrap();
        store.save("classSchedules", "[]").unwrap();
        assert!(dir.path().join("data").join("classSchedules").is_file());
    }
}
