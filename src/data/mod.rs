//! Data module - CSV loading, caching and preparation

pub mod cache;
pub mod loader;
pub mod processor;
pub mod records;
pub mod views;

pub use cache::{RawDataCache, SourceKey};
pub use loader::{load, RawTable};
pub use processor::{region_from_label, DataProcessor, ProcessorError};
pub use records::{
    CleanIncidentRecord, CleanTable, CrimeTypeCount, MonthlyCount, PreparedData, RegionalCount,
};
