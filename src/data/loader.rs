//! CSV Data Loader Module
//! Reads the street-level crime CSV with Polars and parses the report month.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::DataSourceError;

pub const MONTH: &str = "Month";
pub const LONGITUDE: &str = "Longitude";
pub const LATITUDE: &str = "Latitude";
pub const LSOA_NAME: &str = "LSOA name";
pub const CRIME_TYPE_LABEL: &str = "Crime type";

/// Columns the pipeline reads. Anything else is carried along untouched.
pub const REQUIRED_COLUMNS: [&str; 5] = [MONTH, LONGITUDE, LATITUDE, LSOA_NAME, CRIME_TYPE_LABEL];

const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
// `%.f` also matches a missing fractional part.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// The dataset as read from disk.
///
/// `Month` holds a calendar date and the coordinate columns are `Float64`;
/// every other column is exactly as it appeared in the file.
#[derive(Debug, Clone)]
pub struct RawTable {
    df: DataFrame,
    source: PathBuf,
}

impl RawTable {
    /// Wrap a frame that already satisfies the loader contract.
    pub fn from_dataframe(
        df: DataFrame,
        source: impl Into<PathBuf>,
    ) -> Result<Self, DataSourceError> {
        let df = normalize(df)?;
        Ok(Self {
            df,
            source: source.into(),
        })
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }
}

/// Read and parse the dataset at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<RawTable, DataSourceError> {
    load_with_preview(path, DEFAULT_PREVIEW_ROWS)
}

/// Like [`load`], logging the first `preview_rows` rows at debug level.
pub fn load_with_preview(
    path: impl AsRef<Path>,
    preview_rows: usize,
) -> Result<RawTable, DataSourceError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataSourceError::NotFound(path.to_path_buf()));
    }

    info!("Loading crime data from {}", path.display());

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(10000))
        .finish()?
        .collect()?;

    let table = RawTable::from_dataframe(df, path)?;
    info!(
        "Loaded {} rows, {} columns",
        table.df.height(),
        table.df.width()
    );
    if preview_rows > 0 {
        debug!("{}", table.df.head(Some(preview_rows)));
    }

    Ok(table)
}

fn normalize(mut df: DataFrame) -> Result<DataFrame, DataSourceError> {
    for name in REQUIRED_COLUMNS {
        if df.column(name).is_err() {
            return Err(DataSourceError::MissingColumn(name.to_string()));
        }
    }

    for name in [LATITUDE, LONGITUDE] {
        let coords = parse_coordinate_column(df.column(name)?)?;
        df.with_column(coords)?;
    }

    let months = parse_month_column(df.column(MONTH)?)?;
    df.with_column(months)?;

    Ok(df)
}

/// Coordinates as `Float64`. Empty cells become null; any other non-numeric
/// value is an error.
fn parse_coordinate_column(column: &Column) -> Result<Column, DataSourceError> {
    if column.dtype() != &DataType::String {
        return Ok(column.cast(&DataType::Float64)?);
    }

    let values = column.str()?;

    let mut coords: Vec<Option<f64>> = Vec::with_capacity(values.len());
    for (row, value) in values.into_iter().enumerate() {
        let parsed = match value.map(str::trim) {
            None | Some("") => None,
            Some(v) => Some(v.parse::<f64>().map_err(|_| {
                DataSourceError::InvalidCoordinate {
                    column: column.name().to_string(),
                    row,
                    value: v.to_string(),
                }
            })?),
        };
        coords.push(parsed);
    }

    Ok(Column::new(column.name().clone(), coords))
}

fn parse_month_column(column: &Column) -> Result<Column, DataSourceError> {
    if column.dtype() == &DataType::Date {
        return Ok(column.clone());
    }

    let text = column.cast(&DataType::String)?;
    let values = text.str()?;

    let mut days = Vec::with_capacity(values.len());
    for (row, value) in values.into_iter().enumerate() {
        let date = value
            .and_then(parse_month)
            .ok_or_else(|| DataSourceError::InvalidMonth {
                row,
                value: value.unwrap_or_default().to_string(),
            })?;
        days.push(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE);
    }

    Ok(Column::new(MONTH.into(), days).cast(&DataType::Date)?)
}

/// Parse a report month. Police exports use `YYYY-MM`; full dates and
/// timestamps are accepted as well.
pub fn parse_month(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }

    // Zoned timestamps keep their local calendar date.
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    // Year and month only, e.g. "2022-01" or "2022/01".
    let (year, month) = value.split_once(['-', '/'])?;
    if year.len() != 4 {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

/// Convert a `Date` column's physical value back to a calendar date.
pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_formats() {
        let jan = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        assert_eq!(parse_month("2022-01"), Some(jan));
        assert_eq!(parse_month("2022/01"), Some(jan));
        assert_eq!(parse_month(" 2022-01-01 "), Some(jan));
        assert_eq!(parse_month("01/01/2022"), Some(jan));
        assert_eq!(parse_month("2022-01-01T10:30:00"), Some(jan));
        assert_eq!(parse_month("2022-01-01 10:30:00"), Some(jan));
        assert_eq!(
            parse_month("2022-01-20"),
            NaiveDate::from_ymd_opt(2022, 1, 20)
        );
    }

    #[test]
    fn test_parse_month_fractional_and_zoned_timestamps() {
        let date = NaiveDate::from_ymd_opt(2022, 1, 5);
        assert_eq!(parse_month("2022-01-05 00:00:00.000"), date);
        assert_eq!(parse_month("2022-01-05T08:15:30.250"), date);
        assert_eq!(parse_month("2022-01-05T00:00:00Z"), date);
        assert_eq!(parse_month("2022-01-05T23:30:00+01:00"), date);
    }

    #[test]
    fn test_parse_month_slash_dates_are_day_first() {
        assert_eq!(parse_month("01/02/2022"), NaiveDate::from_ymd_opt(2022, 2, 1));
        assert_eq!(parse_month("13/02/2022"), NaiveDate::from_ymd_opt(2022, 2, 13));
    }

    #[test]
    fn test_parse_month_rejects_garbage() {
        assert_eq!(parse_month(""), None);
        assert_eq!(parse_month("January"), None);
        assert_eq!(parse_month("2022-13"), None);
        assert_eq!(parse_month("22-01"), None);
    }

    #[test]
    fn test_epoch_days_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2022, 9, 1).unwrap();
        let days = date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE;
        assert_eq!(date_from_epoch_days(days), Some(date));
        assert_eq!(
            date_from_epoch_days(0),
            NaiveDate::from_ymd_opt(1970, 1, 1)
        );
    }

    #[test]
    fn test_from_dataframe_requires_columns() {
        let df = DataFrame::new(vec![
            Column::new(MONTH.into(), vec!["2022-01"]),
            Column::new(LATITUDE.into(), vec![51.5]),
        ])
        .unwrap();

        let err = RawTable::from_dataframe(df, "inline").unwrap_err();
        assert!(matches!(err, DataSourceError::MissingColumn(ref c) if c == LONGITUDE));
    }

    #[test]
    fn test_from_dataframe_parses_month_and_coords() {
        let df = DataFrame::new(vec![
            Column::new(MONTH.into(), vec!["2022-01", "2022-02"]),
            Column::new(LONGITUDE.into(), vec![Some("-3.1"), None]),
            Column::new(LATITUDE.into(), vec![Some(51.4), Some(51.5)]),
            Column::new(LSOA_NAME.into(), vec!["Cardiff 001A", "Swansea 002B"]),
            Column::new(CRIME_TYPE_LABEL.into(), vec!["Burglary", "Robbery"]),
        ])
        .unwrap();

        let raw = RawTable::from_dataframe(df, "inline").unwrap();
        let frame = raw.dataframe();
        assert_eq!(frame.column(MONTH).unwrap().dtype(), &DataType::Date);
        assert_eq!(frame.column(LONGITUDE).unwrap().dtype(), &DataType::Float64);
        assert_eq!(frame.column(LONGITUDE).unwrap().null_count(), 1);
    }

    #[test]
    fn test_from_dataframe_rejects_bad_month() {
        let df = DataFrame::new(vec![
            Column::new(MONTH.into(), vec!["2022-01", "later"]),
            Column::new(LONGITUDE.into(), vec![-3.1, -3.2]),
            Column::new(LATITUDE.into(), vec![51.4, 51.5]),
            Column::new(LSOA_NAME.into(), vec!["Cardiff 001A", "Swansea 002B"]),
            Column::new(CRIME_TYPE_LABEL.into(), vec!["Burglary", "Robbery"]),
        ])
        .unwrap();

        let err = RawTable::from_dataframe(df, "inline").unwrap_err();
        assert!(matches!(err, DataSourceError::InvalidMonth { row: 1, .. }));
    }

    #[test]
    fn test_from_dataframe_rejects_non_numeric_coordinate() {
        let df = DataFrame::new(vec![
            Column::new(MONTH.into(), vec!["2022-01", "2022-01", "2022-01"]),
            Column::new(LONGITUDE.into(), vec![Some("-3.1"), Some(""), Some("not-a-number")]),
            Column::new(LATITUDE.into(), vec![51.4, 51.4, 51.4]),
            Column::new(
                LSOA_NAME.into(),
                vec!["Cardiff 001A", "Cardiff 001A", "Cardiff 001A"],
            ),
            Column::new(CRIME_TYPE_LABEL.into(), vec!["Burglary", "Burglary", "Burglary"]),
        ])
        .unwrap();

        let err = RawTable::from_dataframe(df, "inline").unwrap_err();
        match err {
            DataSourceError::InvalidCoordinate { column, row, value } => {
                assert_eq!(column, LONGITUDE);
                assert_eq!(row, 2);
                assert_eq!(value, "not-a-number");
            }
            other => panic!("expected InvalidCoordinate, got {other}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = load("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, DataSourceError::NotFound(_)));
    }
}
