//! Error types for the crime dashboard.
//!
//! Loading failures are fatal for a session and surface as [`DataSourceError`].
//! Filters that match nothing surface as [`EmptyResultError`], which callers are
//! expected to render as a "0 crimes" state rather than treat as a failure.

use serde::ser::SerializeStruct;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigValidationError;
use crate::data::ProcessorError;

/// Failure to read the incident dataset into a usable raw table.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Dataset not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] polars::error::PolarsError),

    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Non-numeric {column} {value:?} at row {row}")]
    InvalidCoordinate {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Unparseable report month {value:?} at row {row}")]
    InvalidMonth { row: usize, value: String },
}

/// A requested filter selected no incidents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No incidents match {filter}")]
pub struct EmptyResultError {
    pub filter: String,
}

impl EmptyResultError {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
        }
    }
}

/// Top-level error for dashboard operations.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    EmptyResult(#[from] EmptyResultError),

    #[error("Failed to prepare data: {0}")]
    Processing(#[from] ProcessorError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DashboardError>,
    },
}

impl DashboardError {
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DashboardError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable code used when errors are reported as JSON.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DataSource(DataSourceError::NotFound(_)) => "DATA_NOT_FOUND",
            Self::DataSource(DataSourceError::MissingColumn(_)) => "MISSING_COLUMN",
            Self::DataSource(DataSourceError::InvalidMonth { .. }) => "INVALID_MONTH",
            Self::DataSource(DataSourceError::InvalidCoordinate { .. }) => "INVALID_COORDINATE",
            Self::DataSource(_) => "DATA_SOURCE_ERROR",
            Self::EmptyResult(_) => "EMPTY_RESULT",
            Self::Processing(_) => "PROCESSING_ERROR",
            Self::Config(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Empty results are rendered, not reported as failures.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::EmptyResult(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl Serialize for DashboardError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DashboardError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, DataSourceError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DashboardError::DataSource(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = DashboardError::from(DataSourceError::MissingColumn("Month".to_string()));
        assert_eq!(err.error_code(), "MISSING_COLUMN");

        let err = DashboardError::from(DataSourceError::InvalidCoordinate {
            column: "Longitude".to_string(),
            row: 0,
            value: "n/a".to_string(),
        });
        assert_eq!(err.error_code(), "INVALID_COORDINATE");

        let err = DashboardError::from(EmptyResultError::new("month 4"));
        assert_eq!(err.error_code(), "EMPTY_RESULT");
    }

    #[test]
    fn test_is_recoverable() {
        assert!(DashboardError::from(EmptyResultError::new("month 4")).is_recoverable());
        assert!(
            !DashboardError::from(DataSourceError::NotFound(PathBuf::from("x.csv")))
                .is_recoverable()
        );
    }

    #[test]
    fn test_with_context_preserves_code() {
        let err = DashboardError::from(DataSourceError::MissingColumn("Latitude".to_string()))
            .with_context("Loading crime data");
        assert!(err.to_string().contains("Loading crime data"));
        assert!(err.to_string().contains("Latitude"));
        assert_eq!(err.error_code(), "MISSING_COLUMN");
    }

    #[test]
    fn test_error_serialization() {
        let err = DashboardError::from(DataSourceError::InvalidMonth {
            row: 3,
            value: "soon".to_string(),
        });
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("INVALID_MONTH"));
        assert!(json.contains("soon"));
    }
}
