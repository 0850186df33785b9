//! Crime Dashboard - interactive analysis of South Wales street crime records.
//!
//! The pipeline loads the police street-level CSV once per session, keeps only
//! incidents inside the configured geographic fence, derives the calendar month
//! and region of each incident, and aggregates counts by month, region and
//! crime type. The GUI and the headless report both run it through
//! [`DashboardSession`].
//!
//! ```no_run
//! use crime_dashboard::{DashboardConfig, DashboardSession};
//!
//! let config = DashboardConfig::builder().data_path("south-wales-street.csv").build()?;
//! let mut session = DashboardSession::new(config);
//! let prepared = session.refresh()?;
//! println!("{} crimes kept", prepared.clean.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod gui;
pub mod session;
pub mod stats;

pub use config::{DashboardConfig, DashboardConfigBuilder, GeoFence};
pub use data::{
    CleanIncidentRecord, CleanTable, DataProcessor, PreparedData, RawDataCache, RawTable,
};
pub use error::{DashboardError, DataSourceError, EmptyResultError, Result, ResultExt};
pub use session::{DashboardSession, DashboardSummary, TrendSummary};
pub use stats::{RegionBreakdown, StatsCalculator, TrendFit};
