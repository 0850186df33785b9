//! Statistics Calculator Module
//! Monthly trend regression and per-region crime type rankings.

use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::HashMap;

use crate::data::{CleanTable, MonthlyCount};

/// Ordinary least squares fit of monthly count against month index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Standard error of the slope.
    pub std_err: f64,
    pub t_statistic: f64,
    /// Two-sided p-value for the null hypothesis of zero slope.
    pub p_value: f64,
    pub n: usize,
}

impl TrendFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    /// Human-readable verdict shown under the trend chart.
    pub fn verdict(&self, alpha: f64) -> String {
        if self.is_significant(alpha) {
            format!(
                "p = {:.4} < {alpha}: the monthly trend is statistically significant",
                self.p_value
            )
        } else {
            format!(
                "p = {:.4} >= {alpha}: no significant linear trend in monthly crime counts",
                self.p_value
            )
        }
    }
}

/// Most frequent crime types in one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionBreakdown {
    pub region: String,
    /// (crime type, count), most frequent first.
    pub top_types: Vec<(String, usize)>,
}

pub struct StatsCalculator;

impl StatsCalculator {
    /// Fit `count ~ month_real` by least squares.
    ///
    /// Returns `None` with fewer than three months or when every point has the
    /// same month, since the slope's standard error is then undefined.
    pub fn fit_monthly_trend(monthly: &[MonthlyCount]) -> Option<TrendFit> {
        let points: Vec<(f64, f64)> = monthly
            .iter()
            .map(|m| (m.month_real as f64, m.count as f64))
            .collect();
        Self::linear_regression(&points)
    }

    pub fn linear_regression(points: &[(f64, f64)]) -> Option<TrendFit> {
        let n = points.len();
        if n < 3 {
            return None;
        }
        let nf = n as f64;

        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / nf;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / nf;

        let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
        let syy: f64 = points.iter().map(|p| (p.1 - mean_y).powi(2)).sum();
        let sxy: f64 = points
            .iter()
            .map(|p| (p.0 - mean_x) * (p.1 - mean_y))
            .sum();

        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let ss_res: f64 = points
            .iter()
            .map(|p| (p.1 - (intercept + slope * p.0)).powi(2))
            .sum();
        let r_squared = if syy == 0.0 { 0.0 } else { 1.0 - ss_res / syy };

        let df = nf - 2.0;
        let std_err = (ss_res / df / sxx).sqrt();

        let (t_statistic, p_value) = if std_err == 0.0 {
            // Points lie exactly on the line.
            if slope == 0.0 {
                (0.0, 1.0)
            } else {
                (slope.signum() * f64::INFINITY, 0.0)
            }
        } else {
            let t = slope / std_err;
            let p = StudentsT::new(0.0, 1.0, df)
                .map(|dist| 2.0 * (1.0 - dist.cdf(t.abs())))
                .unwrap_or(f64::NAN);
            (t, p.clamp(0.0, 1.0))
        };

        Some(TrendFit {
            slope,
            intercept,
            r_squared,
            std_err,
            t_statistic,
            p_value,
            n,
        })
    }

    /// Top `n` crime types for one region, most frequent first, ties by name.
    pub fn top_crime_types(clean: &CleanTable, region: &str, n: usize) -> RegionBreakdown {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in clean.iter().filter(|r| r.region == region) {
            *counts.entry(record.crime_type.as_str()).or_default() += 1;
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(crime_type, count)| (crime_type.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);

        RegionBreakdown {
            region: region.to_string(),
            top_types: ranked,
        }
    }

    /// Compute [`Self::top_crime_types`] for several regions in parallel.
    /// Output order follows `regions`.
    pub fn top_crime_types_by_region(
        clean: &CleanTable,
        regions: &[String],
        n: usize,
    ) -> Vec<RegionBreakdown> {
        regions
            .par_iter()
            .map(|region| Self::top_crime_types(clean, region, n))
            .collect()
    }
}
