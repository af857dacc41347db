//! Configuration module for bridge-logger
//!
//! This module handles application configuration including:
//! - The session configuration edited at runtime (filename, instrument, intervals)
//! - Storage settings (temp store location, buffer capacity, save policy)
//! - Simulated source, display and logging settings
//!
//! # App Data Location
//!
//! The default temp store lives in the platform-appropriate data directory:
//! - **Linux**: `~/.local/share/dev.bridge-logger/`
//! - **macOS**: `~/Library/Application Support/dev.bridge-logger/`
//! - **Windows**: `%APPDATA%\dev.bridge-logger\`
//!
//! # File Format
//!
//! Configuration files are TOML. Every section and field is optional:
//!
//! ```toml
//! [session]
//! filename = "run1.csv"
//! instrument_id = "GPIB0::28::INSTR"
//! sample_interval = 0.5
//! display_interval = 1.0
//!
//! [storage]
//! buffer_capacity = 100
//! output_dir = "data"
//! clear_temp_after_save = true
//! ```

use crate::backend::SimulatedPattern;
use crate::error::{BridgeLogError, Result};
use crate::types::{DEFAULT_BUFFER_CAPACITY, MIN_BUFFER_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.bridge-logger";

/// Temp store filename inside the data directory
pub const TEMP_STORE_FILE: &str = "temp_data.txt";

/// Config filename looked up in the data directory when none is given
pub const CONFIG_FILE: &str = "config.toml";

/// Default seconds between samples
pub const DEFAULT_SAMPLE_INTERVAL: f64 = 1.0;

/// Default seconds between display refreshes
pub const DEFAULT_DISPLAY_INTERVAL: f64 = 1.0;

/// Default number of points kept for plotting
pub const DEFAULT_HISTORY_POINTS: usize = 1000;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Default location of the configuration file
pub fn default_config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

fn default_temp_store_path() -> PathBuf {
    app_data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(TEMP_STORE_FILE)
}

/// Convert a seconds value from config into a sleepable duration
///
/// Negative or non-finite values map to zero.
pub fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f64(seconds)
    } else {
        Duration::ZERO
    }
}

// ==================== Session Config ====================

/// The user-editable configuration of a recording session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Destination filename for saves (validated at save time)
    pub filename: String,
    /// Instrument bus address of the bridge
    pub instrument_id: String,
    /// Seconds between samples
    pub sample_interval: f64,
    /// Seconds between display refreshes
    pub display_interval: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            filename: String::new(),
            instrument_id: String::new(),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            display_interval: DEFAULT_DISPLAY_INTERVAL,
        }
    }
}

impl SessionConfig {
    /// Sample interval as a duration
    pub fn sample_period(&self) -> Duration {
        seconds_to_duration(self.sample_interval)
    }

    /// Display interval as a duration
    pub fn display_period(&self) -> Duration {
        seconds_to_duration(self.display_interval)
    }
}

// ==================== Storage Config ====================

/// Where and how samples are persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Append-only temp store for flushed samples
    pub temp_file: PathBuf,
    /// Live buffer capacity before an overflow flush
    pub buffer_capacity: usize,
    /// Directory that save filenames are resolved against
    pub output_dir: PathBuf,
    /// Truncate the temp store and live buffer after a successful save
    pub clear_temp_after_save: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_file: default_temp_store_path(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            output_dir: PathBuf::from("."),
            clear_temp_after_save: true,
        }
    }
}

// ==================== Source / Display / Logging ====================

/// Settings for the simulated bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Waveform generated by the simulator
    pub pattern: SimulatedPattern,
    /// Uniform noise amplitude added to every reading
    pub noise_amplitude: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            pattern: SimulatedPattern::default(),
            noise_amplitude: 0.05,
        }
    }
}

/// Display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Number of recent samples kept for plotting
    pub history_points: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            history_points: DEFAULT_HISTORY_POINTS,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub filter: Option<String>,
    /// Directory for daily rolling log files (console only when unset)
    pub log_dir: Option<PathBuf>,
}

// ==================== App Config ====================

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial session configuration
    pub session: SessionConfig,
    /// Persistence settings
    pub storage: StorageConfig,
    /// Simulated source settings
    pub source: SourceConfig,
    /// Display settings
    pub display: DisplayConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeLogError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            BridgeLogError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| BridgeLogError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            BridgeLogError::Config(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    /// Check values that serde alone cannot enforce
    pub fn validate(&self) -> Result<()> {
        if self.storage.buffer_capacity < MIN_BUFFER_CAPACITY {
            return Err(BridgeLogError::Config(format!(
                "buffer_capacity must be at least {}, got {}",
                MIN_BUFFER_CAPACITY, self.storage.buffer_capacity
            )));
        }
        for (name, value) in [
            ("sample_interval", self.session.sample_interval),
            ("display_interval", self.session.display_interval),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(BridgeLogError::Config(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, value
                )));
            }
        }
        if self.display.history_points == 0 {
            return Err(BridgeLogError::Config(
                "history_points must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
