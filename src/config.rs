//! Dashboard configuration.
//!
//! Configuration can be built in code with [`DashboardConfig::builder()`] or
//! read from a JSON file. Command line flags are applied on top of either.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DashboardError, Result, ResultExt};

/// Default dataset file name, expected next to the program.
pub const DEFAULT_DATA_FILE: &str = "south-wales-street.csv";

/// Significance level for the monthly trend test.
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Number of crime types shown per region.
pub const DEFAULT_TOP_N: usize = 10;

/// Fixed geographic fence for the study region.
///
/// Rows at or east of `max_longitude`, or at or north of `max_latitude`, are
/// discarded rather than clipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFence {
    pub max_longitude: f64,
    pub max_latitude: f64,
}

impl Default for GeoFence {
    fn default() -> Self {
        Self {
            max_longitude: -2.744003,
            max_latitude: 51.918541,
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Path of the incident CSV. Relative paths are tried against the
    /// working directory first, then the executable's directory.
    pub data_path: PathBuf,

    pub fence: GeoFence,

    /// Alpha for the monthly trend test (exclusive bounds 0..1).
    pub significance_level: f64,

    /// Crime types shown per selected region.
    pub top_n: usize,

    /// Rows logged at debug level after loading.
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            fence: GeoFence::default(),
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            top_n: DEFAULT_TOP_N,
            preview_rows: 5,
        }
    }
}

impl DashboardConfig {
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Read a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(DashboardError::from)
            .context(format!("Reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ConfigValidationError::InvalidSignificance(
                self.significance_level,
            ));
        }

        if self.top_n == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.top_n));
        }

        if !self.fence.max_longitude.is_finite() || !self.fence.max_latitude.is_finite() {
            return Err(ConfigValidationError::InvalidFence {
                max_longitude: self.fence.max_longitude,
                max_latitude: self.fence.max_latitude,
            });
        }

        Ok(())
    }

    /// Resolve `data_path` to the file the loader should read.
    ///
    /// Absolute paths are returned unchanged. A relative path that does not
    /// exist under the working directory falls back to the directory holding
    /// the running executable; if neither exists the working-directory form is
    /// returned so the loader can report it.
    pub fn resolve_data_path(&self) -> PathBuf {
        if self.data_path.is_absolute() || self.data_path.exists() {
            return self.data_path.clone();
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(&self.data_path)))
            .filter(|candidate| candidate.exists())
            .unwrap_or_else(|| self.data_path.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid significance level: {0} (must be strictly between 0.0 and 1.0)")]
    InvalidSignificance(f64),

    #[error("Invalid top-N: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("Invalid geographic fence: longitude {max_longitude}, latitude {max_latitude}")]
    InvalidFence { max_longitude: f64, max_latitude: f64 },
}

#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    data_path: Option<PathBuf>,
    fence: Option<GeoFence>,
    significance_level: Option<f64>,
    top_n: Option<usize>,
    preview_rows: Option<usize>,
}

impl DashboardConfigBuilder {
    /// Start from an existing configuration, e.g. one read from disk.
    pub fn from_config(config: DashboardConfig) -> Self {
        Self {
            data_path: Some(config.data_path),
            fence: Some(config.fence),
            significance_level: Some(config.significance_level),
            top_n: Some(config.top_n),
            preview_rows: Some(config.preview_rows),
        }
    }

    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    pub fn fence(mut self, fence: GeoFence) -> Self {
        self.fence = Some(fence);
        self
    }

    pub fn significance_level(mut self, alpha: f64) -> Self {
        self.significance_level = Some(alpha);
        self
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> std::result::Result<DashboardConfig, ConfigValidationError> {
        let defaults = DashboardConfig::default();
        let config = DashboardConfig {
            data_path: self.data_path.unwrap_or(defaults.data_path),
            fence: self.fence.unwrap_or(defaults.fence),
            significance_level: self
                .significance_level
                .unwrap_or(defaults.significance_level),
            top_n: self.top_n.unwrap_or(defaults.top_n),
            preview_rows: self.preview_rows.unwrap_or(defaults.preview_rows),
        };
        config.validate()?;
        Ok(config)
    }
}
