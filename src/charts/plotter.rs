//! Chart Plotter Module
//! Draws the dashboard charts with egui_plot and the egui painter.

use crate::data::{CleanIncidentRecord, MonthlyCount, PreparedData};
use crate::stats::{RegionBreakdown, TrendFit};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Point colour on the crime map
pub const MAP_COLOR: Color32 = Color32::from_rgb(231, 76, 60);

/// Regression line colour on the trend chart
pub const TREND_COLOR: Color32 = Color32::from_rgb(52, 152, 219);

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(255, 87, 34),  // Deep Orange
    Color32::from_rgb(121, 85, 72),  // Brown
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

/// Largest angle covered by one triangle of a pie slice.
const PIE_STEP: f32 = 0.1;

/// Which aggregate the distribution chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Breakdown {
    #[default]
    Month,
    Region,
    CrimeType,
}

impl Breakdown {
    pub const ALL: [Breakdown; 3] = [Breakdown::Month, Breakdown::Region, Breakdown::CrimeType];

    pub fn label(&self) -> &'static str {
        match self {
            Breakdown::Month => "Month",
            Breakdown::Region => "Region",
            Breakdown::CrimeType => "Crime type",
        }
    }

    /// (label, count) pairs for the selected aggregate, in key order.
    pub fn slices(&self, prepared: &PreparedData) -> Vec<(String, usize)> {
        match self {
            Breakdown::Month => prepared
                .monthly
                .iter()
                .map(|m| (month_name(m.month_real), m.count))
                .collect(),
            Breakdown::Region => prepared
                .regional
                .iter()
                .map(|r| (r.region.clone(), r.count))
                .collect(),
            Breakdown::CrimeType => prepared
                .crime_types
                .iter()
                .map(|c| (c.crime_type.clone(), c.count))
                .collect(),
        }
    }
}

/// How the distribution chart is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Pie,
    Bar,
}

pub fn month_name(month: i32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| chrono::Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_else(|| format!("Month {month}"))
}

/// Draws the dashboard charts.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn slice_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Start and end angle of each pie slice, clockwise from 12 o'clock.
    /// Empty when every value is zero.
    pub fn pie_angles(values: &[usize]) -> Vec<(f32, f32)> {
        let total: usize = values.iter().sum();
        if total == 0 {
            return Vec::new();
        }

        let mut start = -FRAC_PI_2;
        values
            .iter()
            .map(|&v| {
                let sweep = TAU * v as f32 / total as f32;
                let slice = (start, start + sweep);
                start += sweep;
                slice
            })
            .collect()
    }

    /// Fitted line across the observed month range.
    pub fn trend_line(monthly: &[MonthlyCount], fit: &TrendFit) -> Vec<[f64; 2]> {
        let first = monthly.iter().map(|m| m.month_real).min();
        let last = monthly.iter().map(|m| m.month_real).max();
        match (first, last) {
            (Some(first), Some(last)) => vec![
                [first as f64, fit.predict(first as f64)],
                [last as f64, fit.predict(last as f64)],
            ],
            _ => Vec::new(),
        }
    }

    /// Scatter incident locations, longitude on x and latitude on y.
    pub fn draw_crime_map(ui: &mut egui::Ui, records: &[&CleanIncidentRecord], height: f32) {
        let points: PlotPoints = records.iter().map(|r| [r.lon, r.lat]).collect();

        Plot::new("crime_map")
            .height(height)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.points(Points::new(points).radius(2.0).color(MAP_COLOR));
            });
    }

    /// Vertical bar chart with one labelled bar per slice.
    pub fn draw_bar_chart(ui: &mut egui::Ui, id: &str, slices: &[(String, usize)], height: f32) {
        let labels: Vec<String> = slices.iter().map(|(label, _)| label.clone()).collect();
        let bars: Vec<Bar> = slices
            .iter()
            .enumerate()
            .map(|(i, (label, count))| {
                Bar::new(i as f64, *count as f64)
                    .name(label)
                    .width(0.7)
                    .fill(Self::slice_color(i))
            })
            .collect();

        Plot::new(id.to_string())
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .y_axis_label("Crimes")
            .x_axis_formatter(move |mark, _range| axis_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars));
            });
    }

    /// Horizontal bars for one region's most frequent crime types, largest on top.
    pub fn draw_region_breakdown(ui: &mut egui::Ui, breakdown: &RegionBreakdown, height: f32) {
        let n = breakdown.top_types.len();
        let labels: Vec<String> = breakdown
            .top_types
            .iter()
            .rev()
            .map(|(crime_type, _)| crime_type.clone())
            .collect();
        let bars: Vec<Bar> = breakdown
            .top_types
            .iter()
            .enumerate()
            .map(|(i, (crime_type, count))| {
                Bar::new((n - 1 - i) as f64, *count as f64)
                    .name(crime_type)
                    .width(0.7)
                    .fill(Self::slice_color(i))
            })
            .collect();

        Plot::new(format!("region_{}", breakdown.region))
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .x_axis_label("Crimes")
            .y_axis_formatter(move |mark, _range| axis_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
            });
    }

    /// Pie chart drawn directly with the painter, followed by a legend.
    pub fn draw_pie_chart(ui: &mut egui::Ui, slices: &[(String, usize)], diameter: f32) {
        let values: Vec<usize> = slices.iter().map(|(_, count)| *count).collect();
        let total: usize = values.iter().sum();

        ui.horizontal(|ui| {
            let (response, painter) =
                ui.allocate_painter(egui::vec2(diameter, diameter), egui::Sense::hover());
            let center = response.rect.center();
            let radius = diameter / 2.0 - 4.0;

            for (i, (start, end)) in Self::pie_angles(&values).into_iter().enumerate() {
                let color = Self::slice_color(i);
                let steps = (((end - start) / PIE_STEP).ceil() as usize).max(1);
                for s in 0..steps {
                    let a0 = start + (end - start) * s as f32 / steps as f32;
                    let a1 = start + (end - start) * (s + 1) as f32 / steps as f32;
                    painter.add(egui::Shape::convex_polygon(
                        vec![
                            center,
                            center + radius * egui::vec2(a0.cos(), a0.sin()),
                            center + radius * egui::vec2(a1.cos(), a1.sin()),
                        ],
                        color,
                        egui::Stroke::NONE,
                    ));
                }
            }

            ui.add_space(12.0);
            ui.vertical(|ui| {
                for (i, (label, count)) in slices.iter().enumerate() {
                    let share = if total > 0 {
                        100.0 * *count as f64 / total as f64
                    } else {
                        0.0
                    };
                    ui.horizontal(|ui| {
                        let (rect, _) =
                            ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                        ui.painter().rect_filled(rect, 2.0, Self::slice_color(i));
                        ui.label(
                            RichText::new(format!("{label}: {count} ({share:.1}%)")).size(12.0),
                        );
                    });
                }
            });
        });
    }

    /// Monthly counts with the fitted regression line.
    pub fn draw_trend_chart(
        ui: &mut egui::Ui,
        monthly: &[MonthlyCount],
        fit: Option<&TrendFit>,
        height: f32,
    ) {
        let observed: PlotPoints = monthly
            .iter()
            .map(|m| [m.month_real as f64, m.count as f64])
            .collect();
        let line = fit.map(|fit| Self::trend_line(monthly, fit));

        Plot::new("monthly_trend")
            .height(height)
            .x_axis_label("Month")
            .y_axis_label("Crimes")
            .allow_scroll(false)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(observed)
                        .radius(4.0)
                        .color(MAP_COLOR)
                        .name("Monthly count"),
                );
                if let Some(line) = line {
                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(line))
                            .color(TREND_COLOR)
                            .width(2.0)
                            .name("OLS fit"),
                    );
                }
            });
    }
}

/// Label for an integer grid mark, blank between categories.
fn axis_label(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CrimeTypeCount, RegionalCount};
    use crate::stats::StatsCalculator;

    #[test]
    fn test_pie_angles_cover_circle() {
        let angles = ChartPlotter::pie_angles(&[1, 1, 2]);
        assert_eq!(angles.len(), 3);
        assert!((angles[0].0 + FRAC_PI_2).abs() < 1e-6);
        assert!((angles[2].1 - angles[0].0 - TAU).abs() < 1e-5);
        assert!(((angles[2].1 - angles[2].0) - TAU / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_pie_angles_empty_total() {
        assert!(ChartPlotter::pie_angles(&[]).is_empty());
        assert!(ChartPlotter::pie_angles(&[0, 0]).is_empty());
    }

    #[test]
    fn test_axis_label() {
        let labels = vec!["Jan".to_string(), "Feb".to_string()];
        assert_eq!(axis_label(&labels, 1.0), "Feb");
        assert_eq!(axis_label(&labels, 0.5), "");
        assert_eq!(axis_label(&labels, 2.0), "");
        assert_eq!(axis_label(&labels, -1.0), "");
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(9), "September");
        assert_eq!(month_name(13), "Month 13");
    }

    #[test]
    fn test_breakdown_slices() {
        let prepared = PreparedData {
            monthly: vec![MonthlyCount {
                month_real: 2,
                count: 4,
            }],
            regional: vec![RegionalCount {
                region: "Cardiff".to_string(),
                count: 4,
            }],
            crime_types: vec![CrimeTypeCount {
                crime_type: "Drugs".to_string(),
                count: 4,
            }],
            ..Default::default()
        };

        assert_eq!(
            Breakdown::Month.slices(&prepared),
            vec![("February".to_string(), 4)]
        );
        assert_eq!(
            Breakdown::Region.slices(&prepared),
            vec![("Cardiff".to_string(), 4)]
        );
        assert_eq!(
            Breakdown::CrimeType.slices(&prepared),
            vec![("Drugs".to_string(), 4)]
        );
    }

    #[test]
    fn test_trend_line_spans_observed_months() {
        let monthly: Vec<MonthlyCount> = [(1, 10), (2, 12), (3, 14)]
            .iter()
            .map(|&(month_real, count)| MonthlyCount { month_real, count })
            .collect();
        let fit = StatsCalculator::fit_monthly_trend(&monthly).unwrap();

        let line = ChartPlotter::trend_line(&monthly, &fit);
        assert_eq!(line.len(), 2);
        assert_eq!(line[0][0], 1.0);
        assert!((line[0][1] - 10.0).abs() < 1e-9);
        assert_eq!(line[1][0], 3.0);
        assert!((line[1][1] - 14.0).abs() < 1e-9);
    }
}
