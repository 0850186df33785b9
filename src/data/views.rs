//! Read-only queries over the clean table used by the dashboard views.

use std::collections::BTreeSet;

use crate::data::records::{CleanIncidentRecord, CleanTable};
use crate::error::EmptyResultError;

/// Incidents reported in calendar month `month` (1-12).
///
/// An empty selection is an [`EmptyResultError`]; callers that only need the
/// figure for a "N crimes" label should use [`count_in_month`].
pub fn crimes_in_month(
    clean: &CleanTable,
    month: i32,
) -> Result<Vec<&CleanIncidentRecord>, EmptyResultError> {
    let selected: Vec<_> = clean.iter().filter(|r| r.month_real == month).collect();
    if selected.is_empty() {
        return Err(EmptyResultError::new(format!("month {month}")));
    }
    Ok(selected)
}

pub fn count_in_month(clean: &CleanTable, month: i32) -> usize {
    clean.iter().filter(|r| r.month_real == month).count()
}

/// Distinct months present, ascending.
pub fn months(clean: &CleanTable) -> Vec<i32> {
    clean
        .iter()
        .map(|r| r.month_real)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct regions present, sorted by name.
pub fn regions(clean: &CleanTable) -> Vec<String> {
    clean
        .iter()
        .map(|r| r.region.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
