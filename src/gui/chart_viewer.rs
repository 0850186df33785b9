//! Chart Viewer Widget
//! Central scrollable panel showing the sections opened in the control panel.

use crate::charts::{month_name, ChartKind, ChartPlotter};
use crate::data::{views, CleanIncidentRecord, CleanTable, PreparedData};
use crate::gui::control_panel::UserSettings;
use crate::stats::{RegionBreakdown, TrendFit};
use egui::{Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 15.0;
const CHART_HEIGHT: f32 = 320.0;
const PIE_DIAMETER: f32 = 280.0;
const RAW_ROW_HEIGHT: f32 = 18.0;

const SIGNIFICANT_COLOR: Color32 = Color32::from_rgb(220, 53, 69);
const NOT_SIGNIFICANT_COLOR: Color32 = Color32::from_rgb(40, 167, 69);

/// Scrollable chart display area.
#[derive(Default)]
pub struct ChartViewer {
    pub prepared: Option<PreparedData>,
    pub trend: Option<TrendFit>,
    pub breakdowns: Vec<RegionBreakdown>,
    pub significance_level: f64,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.prepared = None;
        self.trend = None;
        self.breakdowns.clear();
    }

    pub fn set_data(
        &mut self,
        prepared: PreparedData,
        trend: Option<TrendFit>,
        breakdowns: Vec<RegionBreakdown>,
        significance_level: f64,
    ) {
        self.prepared = Some(prepared);
        self.trend = trend;
        self.breakdowns = breakdowns;
        self.significance_level = significance_level;
    }

    pub fn show(&self, ui: &mut egui::Ui, settings: &UserSettings) {
        let Some(prepared) = &self.prepared else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ui.heading("Analysis of Crime Data in South Wales, UK");
        ui.label("For period Jan - Sep 2022");
        ui.add_space(SECTION_SPACING);

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if !settings.map_closed {
                    Self::show_map_section(ui, prepared, settings);
                    ui.add_space(SECTION_SPACING);
                }
                if !settings.distribution_closed {
                    Self::show_distribution_section(ui, prepared, settings);
                    ui.add_space(SECTION_SPACING);
                }
                if !self.breakdowns.is_empty() {
                    self.show_region_section(ui);
                    ui.add_space(SECTION_SPACING);
                }
                if !settings.trend_closed {
                    self.show_trend_section(ui, prepared);
                }
            });
    }

    fn show_map_section(ui: &mut egui::Ui, prepared: &PreparedData, settings: &UserSettings) {
        ui.label(RichText::new("Crime locations by month").size(18.0).strong());

        let month = settings.month;
        let records = views::crimes_in_month(&prepared.clean, month).unwrap_or_default();
        if !records.is_empty() {
            ChartPlotter::draw_crime_map(ui, &records, CHART_HEIGHT);
        }
        ui.label(Self::month_caption(&prepared.clean, month));

        if settings.show_raw && !records.is_empty() {
            ui.add_space(8.0);
            Self::show_raw_rows(ui, &records);
        }
    }

    /// "N crimes in month M", including months with no incidents.
    fn month_caption(clean: &CleanTable, month: i32) -> String {
        format!(
            "{} crimes in month {} ({})",
            views::count_in_month(clean, month),
            month,
            month_name(month)
        )
    }

    fn show_raw_rows(ui: &mut egui::Ui, records: &[&CleanIncidentRecord]) {
        ui.label(
            RichText::new(format!(
                "{:>10} {:>10} {:>6} {:>6}  {:<16} {}",
                "lat", "lon", "year", "month", "region", "crime_type"
            ))
            .monospace()
            .strong(),
        );
        ScrollArea::vertical()
            .id_salt("raw_rows")
            .max_height(240.0)
            .show_rows(ui, RAW_ROW_HEIGHT, records.len(), |ui, row_range| {
                for record in &records[row_range] {
                    ui.label(
                        RichText::new(format!(
                            "{:>10.6} {:>10.6} {:>6} {:>6}  {:<16} {}",
                            record.lat,
                            record.lon,
                            record.year,
                            record.month_real,
                            record.region,
                            record.crime_type
                        ))
                        .monospace(),
                    );
                }
            });
    }

    fn show_distribution_section(
        ui: &mut egui::Ui,
        prepared: &PreparedData,
        settings: &UserSettings,
    ) {
        ui.label(
            RichText::new(format!(
                "Number of crimes by {}",
                settings.breakdown.label().to_lowercase()
            ))
            .size(18.0)
            .strong(),
        );

        let slices = settings.breakdown.slices(prepared);
        if slices.is_empty() {
            ui.label("0 crimes");
            return;
        }

        match settings.chart_kind {
            ChartKind::Pie => ChartPlotter::draw_pie_chart(ui, &slices, PIE_DIAMETER),
            ChartKind::Bar => ChartPlotter::draw_bar_chart(
                ui,
                &format!("distribution_{}", settings.breakdown.label()),
                &slices,
                CHART_HEIGHT,
            ),
        }
    }

    fn show_region_section(&self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Top crime types by region").size(18.0).strong());

        for breakdown in &self.breakdowns {
            egui::Frame::none()
                .rounding(8.0)
                .stroke(egui::Stroke::new(1.0, Color32::GRAY))
                .fill(ui.visuals().widgets.noninteractive.bg_fill)
                .inner_margin(12.0)
                .show(ui, |ui| {
                    ui.label(RichText::new(&breakdown.region).size(15.0).strong());
                    if breakdown.top_types.is_empty() {
                        ui.label("0 crimes");
                    } else {
                        ChartPlotter::draw_region_breakdown(ui, breakdown, CHART_HEIGHT * 0.8);
                    }
                });
            ui.add_space(8.0);
        }
    }

    fn show_trend_section(&self, ui: &mut egui::Ui, prepared: &PreparedData) {
        ui.label(RichText::new("Monthly crime trend").size(18.0).strong());
        ChartPlotter::draw_trend_chart(ui, &prepared.monthly, self.trend.as_ref(), CHART_HEIGHT);

        match &self.trend {
            Some(fit) => {
                let color = if fit.is_significant(self.significance_level) {
                    SIGNIFICANT_COLOR
                } else {
                    NOT_SIGNIFICANT_COLOR
                };
                ui.label(
                    RichText::new(format!(
                        "slope = {:.2} crimes/month, r² = {:.3}",
                        fit.slope, fit.r_squared
                    ))
                    .size(13.0),
                );
                ui.label(
                    RichText::new(fit.verdict(self.significance_level))
                        .size(13.0)
                        .color(color),
                );
            }
            None => {
                ui.label("Not enough months to test for a trend");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CleanTable {
        CleanTable::new(
            [1, 1, 3]
                .iter()
                .map(|&month_real| CleanIncidentRecord {
                    lat: 51.5,
                    lon: -3.2,
                    year: 2022,
                    month_real,
                    region: "Cardiff".to_string(),
                    crime_type: "Burglary".to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_month_caption_counts_incidents() {
        assert_eq!(
            ChartViewer::month_caption(&table(), 1),
            "2 crimes in month 1 (January)"
        );
    }

    #[test]
    fn test_month_caption_for_empty_month() {
        assert_eq!(
            ChartViewer::month_caption(&table(), 2),
            "0 crimes in month 2 (February)"
        );
    }
}
