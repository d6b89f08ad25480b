//! Configuration file support.
//!
//! Settings come from a TOML file. Every section and key is optional and
//! falls back to the defaults below.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::store::SyntheticSpec;
use crate::sync::MissingDayPolicy;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "daygraph.toml";

/// Upper bound on generated samples
pub const MAX_SAMPLE_COUNT: usize = 5_000_000;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Synthetic data settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
    #[serde(default = "default_min_gap_hours")]
    pub min_gap_hours: f64,
    #[serde(default = "default_max_gap_hours")]
    pub max_gap_hours: f64,
    /// Fixed seed for reproducible data
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Timeline and picker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Columns per day panel
    #[serde(default = "default_day_width")]
    pub day_width: u16,
    #[serde(default = "default_min_day_width")]
    pub min_day_width: u16,
    #[serde(default = "default_max_day_width")]
    pub max_day_width: u16,
    /// Columns moved per scroll key press
    #[serde(default = "default_scroll_step")]
    pub scroll_step: u16,
    /// Frames a programmatic scroll takes; 0 jumps immediately
    #[serde(default = "default_animation_frames")]
    pub animation_frames: u16,
    #[serde(default)]
    pub missing_day: MissingDayPolicy,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file; the system temp directory is used when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_sample_count() -> usize {
    100_000
}

fn default_min_gap_hours() -> f64 {
    0.5
}

fn default_max_gap_hours() -> f64 {
    3.0
}

fn default_day_width() -> u16 {
    36
}

fn default_min_day_width() -> u16 {
    16
}

fn default_max_day_width() -> u16 {
    120
}

fn default_scroll_step() -> u16 {
    4
}

fn default_animation_frames() -> u16 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            sample_count: default_sample_count(),
            min_gap_hours: default_min_gap_hours(),
            max_gap_hours: default_max_gap_hours(),
            seed: None,
        }
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            day_width: default_day_width(),
            min_day_width: default_min_day_width(),
            max_day_width: default_max_day_width(),
            scroll_step: default_scroll_step(),
            animation_frames: default_animation_frames(),
            missing_day: MissingDayPolicy::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl DataSettings {
    pub fn synthetic_spec(&self) -> SyntheticSpec {
        SyntheticSpec {
            count: self.sample_count,
            gap_hours: self.min_gap_hours..=self.max_gap_hours,
        }
    }
}

impl LoggingSettings {
    pub fn log_path(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("daygraph-tui.log"))
    }
}

impl GraphConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GraphConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` if given, else from [`DEFAULT_CONFIG_FILE`] when it
    /// exists, else use the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            return Self::from_file(&fallback);
        }

        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let data = &self.data;
        if data.sample_count > MAX_SAMPLE_COUNT {
            return Err(ConfigError::Invalid(format!(
                "data.sample_count must be at most {}",
                MAX_SAMPLE_COUNT
            )));
        }
        if !(data.min_gap_hours > 0.0 && data.min_gap_hours.is_finite()) {
            return Err(ConfigError::Invalid(
                "data.min_gap_hours must be positive".to_string(),
            ));
        }
        if !(data.max_gap_hours >= data.min_gap_hours && data.max_gap_hours.is_finite()) {
            return Err(ConfigError::Invalid(
                "data.max_gap_hours must not be below data.min_gap_hours".to_string(),
            ));
        }

        let view = &self.view;
        if view.min_day_width < 8 {
            return Err(ConfigError::Invalid(
                "view.min_day_width must be at least 8".to_string(),
            ));
        }
        if view.day_width < view.min_day_width || view.day_width > view.max_day_width {
            return Err(ConfigError::Invalid(format!(
                "view.day_width must be between {} and {}",
                view.min_day_width, view.max_day_width
            )));
        }
        if view.scroll_step == 0 {
            return Err(ConfigError::Invalid(
                "view.scroll_step must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
