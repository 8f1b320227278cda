//! Configuration management for rollcall.
//!
//! Configuration is layered with figment: built-in defaults, then an
//! optional TOML file, then `ROLLCALL_`-prefixed environment variables.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rollcall";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "rollcall.db";

/// Longest accepted post-scan confirmation delay.
const MAX_SUCCESS_DELAY_MS: u64 = 60_000;

/// Application configuration.
///
/// Sources, highest precedence first:
/// 1. Environment variables (`ROLLCALL_SCAN__SUCCESS_DELAY_MS=500`; `__` separates sections)
/// 2. TOML config file at `~/.config/rollcall/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Scan loop configuration.
    pub scan: ScanConfig,
    /// View configuration.
    pub views: ViewsConfig,
    /// Search configuration.
    pub search: SearchConfig,
    /// Export configuration.
    pub export: ExportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/rollcall/rollcall.db`
    pub database_path: Option<PathBuf>,
}

/// Scan loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// How long the success confirmation stays up before the loop ends.
    pub success_delay_ms: u64,
}

/// View configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    /// Number of log entries on the dashboard's recent list.
    pub recent_limit: usize,
}

/// Search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of suggestions.
    pub suggestion_limit: usize,
    /// Minimum query length before suggestions are offered.
    pub suggestion_min_chars: usize,
}

/// Export configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory CSV files are written to. Defaults to the working directory.
    pub directory: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            success_delay_ms: 2_000,
        }
    }
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self { recent_limit: 10 }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: 5,
            suggestion_min_chars: 2,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ROLLCALL_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.search.suggestion_limit == 0 {
            return Err(Error::ConfigValidation {
                message: "suggestion_limit must be greater than 0".to_string(),
            });
        }

        if self.search.suggestion_min_chars == 0 {
            return Err(Error::ConfigValidation {
                message: "suggestion_min_chars must be greater than 0".to_string(),
            });
        }

        if self.scan.success_delay_ms > MAX_SUCCESS_DELAY_MS {
            return Err(Error::ConfigValidation {
                message: format!(
                    "success_delay_ms ({}) cannot exceed {MAX_SUCCESS_DELAY_MS}",
                    self.scan.success_delay_ms
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the export directory, resolving defaults if not set.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the scan success delay as a Duration.
    #[must_use]
    pub fn success_delay(&self) -> Duration {
        Duration::from_millis(self.scan.success_delay_ms)
    }
}
