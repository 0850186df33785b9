//! Control Panel Widget
//! Left side panel with the analysis options.

use crate::charts::{month_name, Breakdown, ChartKind};
use egui::{Color32, ComboBox, RichText, ScrollArea};
use std::path::PathBuf;

/// Sidebar selections driving the central panel.
#[derive(Debug, Clone)]
pub struct UserSettings {
    pub month: i32,
    pub map_closed: bool,
    pub show_raw: bool,
    pub breakdown: Breakdown,
    pub chart_kind: ChartKind,
    pub distribution_closed: bool,
    pub selected_regions: Vec<String>,
    pub trend_closed: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            month: 1,
            map_closed: true,
            show_raw: false,
            breakdown: Breakdown::default(),
            chart_kind: ChartKind::default(),
            distribution_closed: true,
            selected_regions: Vec::new(),
            trend_closed: true,
        }
    }
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub data_path: Option<PathBuf>,
    pub months: Vec<i32>,
    pub regions: Vec<String>,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            data_path: None,
            months: Vec::new(),
            regions: Vec::new(),
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the selectable months and regions after a pipeline run.
    ///
    /// The selected month is clamped to `1..=latest month` and regions
    /// that no longer exist are deselected.
    pub fn update_available(&mut self, months: Vec<i32>, regions: Vec<String>) {
        if let Some(&last) = months.last() {
            self.settings.month = self.settings.month.clamp(1, last.max(1));
        }
        self.settings
            .selected_regions
            .retain(|r| regions.contains(r));
        self.months = months;
        self.regions = regions;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn month_range(&self) -> (i32, i32) {
        match self.months.last() {
            Some(&last) => (1, last.max(1)),
            None => (1, 12),
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut changed = false;
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("Analysis Options")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Please follow the instructions below to access the analysis sections.")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let name = self
                        .data_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file".to_string());
                    ui.label(RichText::new(name).size(12.0));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("⟳ Reload").clicked() {
                            action = ControlPanelAction::Reload;
                        }
                    });
                });
            });

        ui.add_space(10.0);
        ui.separator();

        // ===== Crime map by month =====
        ui.label(RichText::new("🗺 The crime map by month").size(14.0).strong());
        let (first, last) = self.month_range();
        ui.horizontal(|ui| {
            ui.label("Month");
            changed |= ui
                .add(egui::DragValue::new(&mut self.settings.month).range(first..=last))
                .changed();
            ui.label(RichText::new(month_name(self.settings.month)).color(Color32::GRAY));
        });
        changed |= ui.checkbox(&mut self.settings.map_closed, "Close").changed();
        if !self.settings.map_closed {
            changed |= ui
                .checkbox(&mut self.settings.show_raw, "Show raw data")
                .changed();
        }

        ui.add_space(10.0);
        ui.separator();

        // ===== Distribution =====
        ui.label(RichText::new("📊 Crime distribution").size(14.0).strong());
        ui.horizontal(|ui| {
            ui.label("Breakdown:");
            ComboBox::from_id_salt("breakdown")
                .selected_text(self.settings.breakdown.label())
                .show_ui(ui, |ui| {
                    for option in Breakdown::ALL {
                        changed |= ui
                            .selectable_value(&mut self.settings.breakdown, option, option.label())
                            .changed();
                    }
                });
        });
        ui.horizontal(|ui| {
            changed |= ui
                .radio_value(&mut self.settings.chart_kind, ChartKind::Pie, "Pie chart")
                .changed();
            changed |= ui
                .radio_value(&mut self.settings.chart_kind, ChartKind::Bar, "Bar chart")
                .changed();
        });
        changed |= ui
            .checkbox(&mut self.settings.distribution_closed, "Close")
            .changed();

        ui.add_space(10.0);
        ui.separator();

        // ===== Regions =====
        ui.label(RichText::new("🏙 Crime types by region").size(14.0).strong());
        ui.label(RichText::new("Select regions to compare").size(11.0).color(Color32::GRAY));
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt("region_select")
                    .max_height(160.0)
                    .show(ui, |ui| {
                        for region in &self.regions {
                            let mut selected = self.settings.selected_regions.contains(region);
                            if ui.checkbox(&mut selected, region.as_str()).changed() {
                                if selected {
                                    self.settings.selected_regions.push(region.clone());
                                } else {
                                    self.settings.selected_regions.retain(|r| r != region);
                                }
                                changed = true;
                            }
                        }
                    });
            });
        ui.horizontal(|ui| {
            if ui.small_button("Clear All").clicked() && !self.settings.selected_regions.is_empty()
            {
                self.settings.selected_regions.clear();
                changed = true;
            }
        });

        ui.add_space(10.0);
        ui.separator();

        // ===== Trend =====
        ui.label(RichText::new("📈 Monthly trend").size(14.0).strong());
        changed |= ui.checkbox(&mut self.settings.trend_closed, "Close").changed();

        ui.add_space(10.0);
        ui.separator();

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        if action == ControlPanelAction::None && changed {
            action = ControlPanelAction::SettingsChanged;
        }
        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    SettingsChanged,
    Reload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_hide_sections() {
        let settings = UserSettings::default();
        assert_eq!(settings.month, 1);
        assert!(settings.map_closed);
        assert!(settings.distribution_closed);
        assert!(settings.trend_closed);
        assert!(!settings.show_raw);
    }

    #[test]
    fn test_update_available_clamps_and_prunes() {
        let mut panel = ControlPanel::new();
        panel.settings.month = 11;
        panel.settings.selected_regions = vec!["Cardiff".to_string(), "Atlantis".to_string()];

        panel.update_available(
            vec![1, 2, 9],
            vec!["Cardiff".to_string(), "Swansea".to_string()],
        );

        assert_eq!(panel.settings.month, 9);
        assert_eq!(panel.settings.selected_regions, vec!["Cardiff".to_string()]);
        assert_eq!(panel.month_range(), (1, 9));
    }

    #[test]
    fn test_month_range_without_data() {
        assert_eq!(ControlPanel::new().month_range(), (1, 12));
    }
}
