//! # Station Configuration
//!
//! Which till this is and where its database lives.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DUKA_STATION_ID=POS-02                                             │
//! │     DUKA_DB_PATH=/var/lib/duka/duka.db                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/dukapos/station.toml (Linux)                             │
//! │     ~/Library/Application Support/com.duka.pos/station.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     station POS-01, platform data dir                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [station]
//! id = "POS-01"
//! shop_name = "Mama Njeri Shop"
//!
//! [database]
//! path = "/var/lib/duka/duka.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use duka_core::validation::validate_station_prefix;
use duka_core::DEFAULT_STATION;

use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;

// =============================================================================
// Sections
// =============================================================================

/// Identity of this till.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    /// Receipt number prefix, e.g. `POS-01`.
    #[serde(default = "default_station_id")]
    pub id: String,

    /// Printed on receipts and tax invoices.
    #[serde(default)]
    pub shop_name: String,
}

fn default_station_id() -> String {
    DEFAULT_STATION.to_string()
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            id: default_station_id(),
            shop_name: String::new(),
        }
    }
}

/// Database location and pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. `None` uses the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits on SQLITE_BUSY before giving up.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

// =============================================================================
// DukaConfig
// =============================================================================

/// Complete station configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DukaConfig {
    #[serde(default)]
    pub station: StationConfig,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl DukaConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (station.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading station config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load station config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DbResult<()> {
        validate_station_prefix(&self.station.id)
            .map_err(|e| DbError::Config(e.to_string()))?;

        if self.database.max_connections == 0 {
            return Err(DbError::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("DUKA_STATION_ID") {
            debug!(station = %id, "Overriding station id from environment");
            self.station.id = id;
        }

        if let Ok(name) = std::env::var("DUKA_SHOP_NAME") {
            self.station.shop_name = name;
        }

        if let Ok(path) = std::env::var("DUKA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "duka", "pos")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("station.toml"))
    }

    /// Resolves the database file, falling back to the platform data dir.
    ///
    /// ## Platform-Specific Paths
    /// - **Linux**: `~/.local/share/dukapos/duka.db`
    /// - **macOS**: `~/Library/Application Support/com.duka.pos/duka.db`
    /// - **Windows**: `%APPDATA%\duka\pos\data\duka.db`
    pub fn database_path(&self) -> DbResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs()
            .ok_or_else(|| DbError::Config("Could not determine app data directory".into()))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("duka.db"))
    }

    /// Builds the pool configuration for this station.
    pub fn db_config(&self) -> DbResult<DbConfig> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms)))
    }

    /// Returns the station id.
    pub fn station_id(&self) -> &str {
        &self.station.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DukaConfig::default();
        assert_eq!(config.station_id(), "POS-01");
        assert_eq!(config.database.max_connections, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: DukaConfig = toml::from_str(
            r#"
            [station]
            id = "TILL-2"
            shop_name = "Kibanda"

            [database]
            path = "/tmp/duka.db"
            busy_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.station.id, "TILL-2");
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/duka.db")));
        assert_eq!(config.database.busy_timeout_ms, 250);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_validation() {
        let mut config = DukaConfig::default();
        config.station.id = "bad id".into();
        assert!(config.validate().is_err());

        config.station.id = "POS-03".into();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station.toml");
        std::fs::write(&path, "[station]\nid = \"POS-09\"\n").unwrap();

        let config = DukaConfig::load(Some(path)).unwrap();
        // DUKA_STATION_ID is not set in the test environment.
        if std::env::var("DUKA_STATION_ID").is_err() {
            assert_eq!(config.station_id(), "POS-09");
        }
    }

    #[test]
    fn test_explicit_db_path() {
        let mut config = DukaConfig::default();
        config.database.path = Some(PathBuf::from("/tmp/x.db"));
        let db = config.db_config().unwrap();
        assert_eq!(db.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(db.busy_timeout, Duration::from_millis(5_000));
    }
}
