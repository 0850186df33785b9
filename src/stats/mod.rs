//! Statistics module - trend test and regional rankings

mod calculator;

pub use calculator::{RegionBreakdown, StatsCalculator, TrendFit};
