//! One dashboard session: configuration, the raw-data cache, and the
//! per-interaction pipeline run shared by the GUI and the headless CLI.

use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::data::{
    CrimeTypeCount, DataProcessor, MonthlyCount, PreparedData, RawDataCache, RegionalCount,
};
use crate::error::{Result, ResultExt};
use crate::stats::{RegionBreakdown, StatsCalculator, TrendFit};

pub struct DashboardSession {
    config: DashboardConfig,
    cache: RawDataCache,
}

impl DashboardSession {
    pub fn new(config: DashboardConfig) -> Self {
        let cache = RawDataCache::new().with_preview_rows(config.preview_rows);
        Self { config, cache }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn data_path(&self) -> PathBuf {
        self.config.resolve_data_path()
    }

    /// Re-run preparation against the cached raw table. The file is only read
    /// on the first call or after it changes on disk.
    pub fn refresh(&mut self) -> Result<PreparedData> {
        self.run_pipeline().map(|(_, prepared)| prepared)
    }

    fn run_pipeline(&mut self) -> Result<(usize, PreparedData)> {
        let path = self.data_path();
        let raw = self
            .cache
            .get_or_load(&path)
            .context("Loading crime data")?;
        debug!("Preparing {} raw rows", raw.height());
        let prepared = DataProcessor::prepare(&raw, &self.config.fence)?;
        Ok((raw.height(), prepared))
    }

    /// Drop the cached table so the next refresh re-reads the file.
    pub fn reload(&mut self) -> Result<PreparedData> {
        self.cache.invalidate();
        self.refresh()
    }

    pub fn cache(&self) -> &RawDataCache {
        &self.cache
    }

    /// Run the pipeline and collect everything the headless report prints.
    pub fn summary(&mut self, regions: &[String]) -> Result<DashboardSummary> {
        let (raw_rows, prepared) = self.run_pipeline()?;
        Ok(DashboardSummary::build(
            self.data_path(),
            raw_rows,
            prepared,
            regions,
            &self.config,
        ))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendSummary {
    #[serde(flatten)]
    pub fit: TrendFit,
    pub significance_level: f64,
    pub significant: bool,
    pub verdict: String,
}

/// Serializable snapshot of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub source: PathBuf,
    pub raw_rows: usize,
    pub clean_rows: usize,
    pub monthly: Vec<MonthlyCount>,
    pub regional: Vec<RegionalCount>,
    pub crime_types: Vec<CrimeTypeCount>,
    pub trend: Option<TrendSummary>,
    pub region_breakdowns: Vec<RegionBreakdown>,
}

impl DashboardSummary {
    /// Pretty-printed JSON for `--json` output.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn build(
        source: PathBuf,
        raw_rows: usize,
        prepared: PreparedData,
        regions: &[String],
        config: &DashboardConfig,
    ) -> Self {
        let alpha = config.significance_level;
        let trend = StatsCalculator::fit_monthly_trend(&prepared.monthly).map(|fit| TrendSummary {
            fit,
            significance_level: alpha,
            significant: fit.is_significant(alpha),
            verdict: fit.verdict(alpha),
        });
        let region_breakdowns =
            StatsCalculator::top_crime_types_by_region(&prepared.clean, regions, config.top_n);

        Self {
            source,
            raw_rows,
            clean_rows: prepared.clean.len(),
            monthly: prepared.monthly,
            regional: prepared.regional,
            crime_types: prepared.crime_types,
            trend,
            region_breakdowns,
        }
    }
}
