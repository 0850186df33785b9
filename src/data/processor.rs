//! Data Processor Module
//! Turns the raw incident table into clean records and grouped counts.

use chrono::Datelike;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::GeoFence;
use crate::data::loader::{
    date_from_epoch_days, RawTable, CRIME_TYPE_LABEL, LATITUDE, LONGITUDE, LSOA_NAME, MONTH,
};
use crate::data::records::{
    CleanIncidentRecord, CleanTable, CrimeTypeCount, MonthlyCount, PreparedData, RegionalCount,
    COUNT, CRIME_TYPE, MONTH_REAL, REGION,
};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Report month out of range at row {0}")]
    InvalidDate(usize),
}

/// First whitespace-delimited token of an area label, e.g. "Cardiff" for
/// "Cardiff 032F". Blank labels have no region.
pub fn region_from_label(label: &str) -> Option<&str> {
    label.split_whitespace().next()
}

/// Handles cleaning and aggregation of the incident data.
pub struct DataProcessor;

impl DataProcessor {
    /// Run the full preparation pipeline.
    ///
    /// Rows without coordinates, outside the fence, without a region or without
    /// a crime type are dropped. The function has no side effects; calling it
    /// twice on the same input gives identical output.
    pub fn prepare(raw: &RawTable, fence: &GeoFence) -> Result<PreparedData, ProcessorError> {
        let fenced = Self::apply_fence(raw.dataframe(), fence)?;
        debug!(
            "{} of {} rows inside the geographic fence",
            fenced.height(),
            raw.height()
        );

        let clean = Self::derive_records(&fenced)?;
        let frame = clean.to_dataframe()?;

        let monthly = Self::monthly_counts(&frame)?;
        let regional = Self::regional_counts(&frame)?;
        let crime_types = Self::crime_type_counts(&frame)?;

        info!(
            "Prepared {} incidents: {} months, {} regions, {} crime types",
            clean.len(),
            monthly.len(),
            regional.len(),
            crime_types.len()
        );

        Ok(PreparedData {
            clean,
            monthly,
            regional,
            crime_types,
        })
    }

    /// Drop rows without coordinates, then rows at or beyond the fence.
    pub fn apply_fence(df: &DataFrame, fence: &GeoFence) -> Result<DataFrame, ProcessorError> {
        let fenced = df
            .clone()
            .lazy()
            .filter(col(LATITUDE).is_not_null().and(col(LONGITUDE).is_not_null()))
            .filter(col(LONGITUDE).lt(lit(fence.max_longitude)))
            .filter(col(LATITUDE).lt(lit(fence.max_latitude)))
            .collect()?;
        Ok(fenced)
    }

    /// Build clean records from fenced rows, keeping only the retained fields.
    fn derive_records(df: &DataFrame) -> Result<CleanTable, ProcessorError> {
        let lats = df.column(LATITUDE)?.cast(&DataType::Float64)?;
        let lons = df.column(LONGITUDE)?.cast(&DataType::Float64)?;
        let months = df.column(MONTH)?.cast(&DataType::Int32)?;
        let labels = df.column(LSOA_NAME)?.cast(&DataType::String)?;
        let crime_types = df.column(CRIME_TYPE_LABEL)?.cast(&DataType::String)?;

        let lats = lats.f64()?;
        let lons = lons.f64()?;
        let months = months.i32()?;
        let labels = labels.str()?;
        let crime_types = crime_types.str()?;

        let mut records = Vec::with_capacity(df.height());
        let mut dropped_region = 0usize;
        let mut dropped_type = 0usize;

        for i in 0..df.height() {
            let (Some(lat), Some(lon)) = (lats.get(i), lons.get(i)) else {
                continue;
            };

            let date = months
                .get(i)
                .and_then(date_from_epoch_days)
                .ok_or(ProcessorError::InvalidDate(i))?;

            let Some(region) = labels.get(i).and_then(region_from_label) else {
                dropped_region += 1;
                continue;
            };

            // Surrounding whitespace would split one category in two.
            let crime_type = match crime_types.get(i).map(str::trim) {
                Some(t) if !t.is_empty() => t,
                _ => {
                    dropped_type += 1;
                    continue;
                }
            };

            records.push(CleanIncidentRecord {
                lat,
                lon,
                year: date.year(),
                month_real: date.month() as i32,
                region: region.to_string(),
                crime_type: crime_type.to_string(),
            });
        }

        if dropped_region > 0 {
            debug!("Dropped {} rows with no region", dropped_region);
        }
        if dropped_type > 0 {
            debug!("Dropped {} rows with no crime type", dropped_type);
        }

        Ok(CleanTable::new(records))
    }

    /// Count rows per distinct value of `key`, ordered by key.
    fn count_by(frame: &DataFrame, key: &str) -> Result<DataFrame, ProcessorError> {
        let counts = frame
            .clone()
            .lazy()
            .group_by([col(key)])
            .agg([len().alias(COUNT)])
            .sort([key], SortMultipleOptions::default())
            .collect()?;
        Ok(counts)
    }

    fn count_values(counts: &DataFrame) -> Result<Vec<usize>, ProcessorError> {
        let values = counts.column(COUNT)?.cast(&DataType::UInt64)?;
        Ok(values
            .u64()?
            .into_iter()
            .map(|v| v.unwrap_or(0) as usize)
            .collect())
    }

    fn string_keys(counts: &DataFrame, key: &str) -> Result<Vec<String>, ProcessorError> {
        let keys = counts.column(key)?.cast(&DataType::String)?;
        Ok(keys
            .str()?
            .into_iter()
            .map(|k| k.unwrap_or_default().to_string())
            .collect())
    }

    pub fn monthly_counts(frame: &DataFrame) -> Result<Vec<MonthlyCount>, ProcessorError> {
        let counts = Self::count_by(frame, MONTH_REAL)?;
        let months = counts.column(MONTH_REAL)?.cast(&DataType::Int32)?;
        let months: Vec<i32> = months.i32()?.into_iter().flatten().collect();

        Ok(months
            .into_iter()
            .zip(Self::count_values(&counts)?)
            .map(|(month_real, count)| MonthlyCount { month_real, count })
            .collect())
    }

    pub fn regional_counts(frame: &DataFrame) -> Result<Vec<RegionalCount>, ProcessorError> {
        let counts = Self::count_by(frame, REGION)?;
        Ok(Self::string_keys(&counts, REGION)?
            .into_iter()
            .zip(Self::count_values(&counts)?)
            .map(|(region, count)| RegionalCount { region, count })
            .collect())
    }

    pub fn crime_type_counts(frame: &DataFrame) -> Result<Vec<CrimeTypeCount>, ProcessorError> {
        let counts = Self::count_by(frame, CRIME_TYPE)?;
        Ok(Self::string_keys(&counts, CRIME_TYPE)?
            .into_iter()
            .zip(Self::count_values(&counts)?)
            .map(|(crime_type, count)| CrimeTypeCount { crime_type, count })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(rows: &[(&str, Option<f64>, Option<f64>, Option<&str>, Option<&str>)]) -> RawTable {
        let df = DataFrame::new(vec![
            Column::new(
                MONTH.into(),
                rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            ),
            Column::new(
                LONGITUDE.into(),
                rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            ),
            Column::new(
                LATITUDE.into(),
                rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            ),
            Column::new(
                LSOA_NAME.into(),
                rows.iter().map(|r| r.3).collect::<Vec<_>>(),
            ),
            Column::new(
                CRIME_TYPE_LABEL.into(),
                rows.iter().map(|r| r.4).collect::<Vec<_>>(),
            ),
        ])
        .unwrap();
        RawTable::from_dataframe(df, "inline").unwrap()
    }

    #[test]
    fn test_region_from_label() {
        assert_eq!(region_from_label("Cardiff East"), Some("Cardiff"));
        assert_eq!(region_from_label("  Rhondda  Cynon Taf 001A"), Some("Rhondda"));
        assert_eq!(region_from_label("Swansea"), Some("Swansea"));
        assert_eq!(region_from_label("   "), None);
        assert_eq!(region_from_label(""), None);
    }

    #[test]
    fn test_worked_example() {
        let raw = raw(&[
            ("2022-01-05", Some(-3.0), Some(51.0), Some("Cardiff East"), Some("Burglary")),
            ("2022-01-20", Some(-3.0), Some(51.0), Some("Cardiff East"), Some("Robbery")),
            ("2022-02-01", Some(-2.0), Some(51.0), Some("Newport"), Some("Burglary")),
        ]);

        let prepared = DataProcessor::prepare(&raw, &GeoFence::default()).unwrap();

        assert_eq!(prepared.clean.len(), 2);
        assert!(prepared.clean.iter().all(|r| r.region == "Cardiff"));
        assert_eq!(
            prepared.monthly,
            vec![MonthlyCount {
                month_real: 1,
                count: 2
            }]
        );
        assert_eq!(
            prepared.regional,
            vec![RegionalCount {
                region: "Cardiff".to_string(),
                count: 2
            }]
        );
    }

    #[test]
    fn test_drops_missing_coordinates_and_fence_boundary() {
        let raw = raw(&[
            ("2022-01", None, Some(51.5), Some("Cardiff 001"), Some("Arson")),
            ("2022-01", Some(-3.1), None, Some("Cardiff 001"), Some("Arson")),
            ("2022-01", Some(-2.744003), Some(51.5), Some("Cardiff 001"), Some("Arson")),
            ("2022-01", Some(-3.1), Some(51.918541), Some("Cardiff 001"), Some("Arson")),
            ("2022-01", Some(-3.1), Some(51.5), Some("Cardiff 001"), Some("Arson")),
        ]);

        let prepared = DataProcessor::prepare(&raw, &GeoFence::default()).unwrap();

        assert_eq!(prepared.clean.len(), 1);
        let record = &prepared.clean.records()[0];
        assert_eq!(record.lon, -3.1);
        assert_eq!(record.lat, 51.5);
    }

    #[test]
    fn test_drops_blank_region_and_crime_type() {
        let raw = raw(&[
            ("2022-03", Some(-3.1), Some(51.5), Some("   "), Some("Arson")),
            ("2022-03", Some(-3.1), Some(51.5), None, Some("Arson")),
            ("2022-03", Some(-3.1), Some(51.5), Some("Bridgend 004C"), Some(" ")),
            ("2022-03", Some(-3.1), Some(51.5), Some("Bridgend 004C"), None),
            ("2022-03", Some(-3.1), Some(51.5), Some("Bridgend 004C"), Some("Drugs")),
        ]);

        let prepared = DataProcessor::prepare(&raw, &GeoFence::default()).unwrap();

        assert_eq!(prepared.clean.len(), 1);
        assert_eq!(prepared.clean.records()[0].region, "Bridgend");
        assert_eq!(prepared.clean.records()[0].crime_type, "Drugs");
    }

    #[test]
    fn test_crime_type_padding_is_trimmed() {
        let raw = raw(&[
            ("2022-03", Some(-3.1), Some(51.5), Some("Bridgend 004C"), Some(" Drugs ")),
            ("2022-03", Some(-3.1), Some(51.5), Some("Bridgend 004C"), Some("Drugs")),
        ]);

        let prepared = DataProcessor::prepare(&raw, &GeoFence::default()).unwrap();

        assert!(prepared.clean.iter().all(|r| r.crime_type == "Drugs"));
        assert_eq!(
            prepared.crime_types,
            vec![CrimeTypeCount {
                crime_type: "Drugs".to_string(),
                count: 2
            }]
        );
    }

    #[test]
    fn test_year_and_month_derived() {
        let raw = raw(&[
            ("2021-12", Some(-3.1), Some(51.5), Some("Swansea 010A"), Some("Robbery")),
            ("2022-09-30", Some(-3.1), Some(51.5), Some("Swansea 010A"), Some("Robbery")),
        ]);

        let prepared = DataProcessor::prepare(&raw, &GeoFence::default()).unwrap();
        let records = prepared.clean.records();

        assert_eq!((records[0].year, records[0].month_real), (2021, 12));
        assert_eq!((records[1].year, records[1].month_real), (2022, 9));
    }

    #[test]
    fn test_aggregates_partition_clean_table() {
        let raw = raw(&[
            ("2022-01", Some(-3.1), Some(51.5), Some("Cardiff 001"), Some("Arson")),
            ("2022-01", Some(-3.2), Some(51.4), Some("Swansea 002"), Some("Drugs")),
            ("2022-02", Some(-3.3), Some(51.6), Some("Cardiff 003"), Some("Drugs")),
            ("2022-03", Some(-3.4), Some(51.7), Some("Neath 004"), Some("Drugs")),
            ("2022-03", Some(-1.0), Some(51.7), Some("Newport 005"), Some("Drugs")),
        ]);

        let prepared = DataProcessor::prepare(&raw, &GeoFence::default()).unwrap();
        let total = prepared.clean.len();

        assert_eq!(total, 4);
        assert_eq!(prepared.monthly.iter().map(|c| c.count).sum::<usize>(), total);
        assert_eq!(prepared.regional.iter().map(|c| c.count).sum::<usize>(), total);
        assert_eq!(
            prepared.crime_types.iter().map(|c| c.count).sum::<usize>(),
            total
        );

        assert_eq!(
            prepared.crime_types,
            vec![
                CrimeTypeCount {
                    crime_type: "Arson".to_string(),
                    count: 1
                },
                CrimeTypeCount {
                    crime_type: "Drugs".to_string(),
                    count: 3
                },
            ]
        );
        let months: Vec<i32> = prepared.monthly.iter().map(|c| c.month_real).collect();
        assert_eq!(months, vec![1, 2, 3]);
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let raw = raw(&[
            ("2022-01", Some(-3.1), Some(51.5), Some("Cardiff 001"), Some("Arson")),
            ("2022-02", Some(-3.2), Some(51.4), Some("Swansea 002"), Some("Drugs")),
            ("2022-02", Some(-3.3), Some(51.6), Some("Cardiff 003"), Some("Drugs")),
        ]);

        let first = DataProcessor::prepare(&raw, &GeoFence::default()).unwrap();
        let second = DataProcessor::prepare(&raw, &GeoFence::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_everything_fenced_out_gives_empty_aggregates() {
        let raw = raw(&[
            ("2022-01", Some(-2.0), Some(51.5), Some("Newport 001"), Some("Arson")),
            ("2022-01", Some(-3.0), Some(53.0), Some("Conwy 001"), Some("Arson")),
        ]);

        let prepared = DataProcessor::prepare(&raw, &GeoFence::default()).unwrap();

        assert!(prepared.clean.is_empty());
        assert!(prepared.monthly.is_empty());
        assert!(prepared.regional.is_empty());
        assert!(prepared.crime_types.is_empty());
    }

    #[test]
    fn test_custom_fence() {
        let raw = raw(&[
            ("2022-01", Some(-3.5), Some(51.5), Some("Swansea 001"), Some("Arson")),
            ("2022-01", Some(-3.1), Some(51.5), Some("Cardiff 001"), Some("Arson")),
        ]);
        let fence = GeoFence {
            max_longitude: -3.3,
            max_latitude: 52.0,
        };

        let prepared = DataProcessor::prepare(&raw, &fence).unwrap();
        assert_eq!(prepared.clean.len(), 1);
        assert_eq!(prepared.clean.records()[0].region, "Swansea");
    }
}
