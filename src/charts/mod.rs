//! Charts module - Chart rendering

mod plotter;

pub use plotter::{month_name, Breakdown, ChartKind, ChartPlotter};
