//! Typed rows and aggregate tables produced by the preparer.

use polars::prelude::*;
use serde::Serialize;

pub const LAT: &str = "lat";
pub const LON: &str = "lon";
pub const YEAR: &str = "year";
pub const MONTH_REAL: &str = "month_real";
pub const REGION: &str = "region";
pub const CRIME_TYPE: &str = "crime_type";
pub const COUNT: &str = "count";

/// One analysis-ready incident. The fields are the complete set of retained
/// columns; everything else in the source file is discarded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanIncidentRecord {
    pub lat: f64,
    pub lon: f64,
    pub year: i32,
    pub month_real: i32,
    pub region: String,
    pub crime_type: String,
}

/// Cleaned incidents, numbered 0..n in retained order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanTable {
    records: Vec<CleanIncidentRecord>,
}

impl CleanTable {
    pub fn new(records: Vec<CleanIncidentRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CleanIncidentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CleanIncidentRecord> {
        self.records.iter()
    }

    /// Columnar view with columns `lat, lon, year, month_real, region, crime_type`.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let n = self.records.len();
        let mut lats = Vec::with_capacity(n);
        let mut lons = Vec::with_capacity(n);
        let mut years = Vec::with_capacity(n);
        let mut months = Vec::with_capacity(n);
        let mut regions = Vec::with_capacity(n);
        let mut crime_types = Vec::with_capacity(n);

        for record in &self.records {
            lats.push(record.lat);
            lons.push(record.lon);
            years.push(record.year);
            months.push(record.month_real);
            regions.push(record.region.clone());
            crime_types.push(record.crime_type.clone());
        }

        DataFrame::new(vec![
            Column::new(LAT.into(), lats),
            Column::new(LON.into(), lons),
            Column::new(YEAR.into(), years),
            Column::new(MONTH_REAL.into(), months),
            Column::new(REGION.into(), regions),
            Column::new(CRIME_TYPE.into(), crime_types),
        ])
    }
}

impl<'a> IntoIterator for &'a CleanTable {
    type Item = &'a CleanIncidentRecord;
    type IntoIter = std::slice::Iter<'a, CleanIncidentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month_real: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionalCount {
    pub region: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrimeTypeCount {
    pub crime_type: String,
    pub count: usize,
}

/// Everything one pipeline run hands to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreparedData {
    pub clean: CleanTable,
    pub monthly: Vec<MonthlyCount>,
    pub regional: Vec<RegionalCount>,
    pub crime_types: Vec<CrimeTypeCount>,
}
