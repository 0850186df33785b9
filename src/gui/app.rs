//! Crime Dashboard Main Application
//! Main window with control panel and chart viewer.

use crate::data::views;
use crate::error::Result;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::session::DashboardSession;
use crate::stats::StatsCalculator;
use egui::SidePanel;
use tracing::{error, info};

/// Main application window.
pub struct CrimeDashboardApp {
    session: DashboardSession,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
}

impl CrimeDashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, session: DashboardSession) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            session,
        };
        app.control_panel.data_path = Some(app.session.data_path());
        app.refresh(false);
        app
    }

    /// Re-run the pipeline and hand the results to the viewer.
    ///
    /// Every interaction goes through here, so the views always reflect the
    /// current settings. With `reload` the cached raw table is dropped first.
    fn refresh(&mut self, reload: bool) {
        match self.run(reload) {
            Ok(status) => self.control_panel.set_status(status),
            Err(e) => {
                error!("[{}] {}", e.error_code(), e);
                self.chart_viewer.clear();
                self.control_panel.set_status(format!("Error: {e}"));
            }
        }
    }

    fn run(&mut self, reload: bool) -> Result<String> {
        let prepared = if reload {
            info!("Reloading crime data");
            self.session.reload()?
        } else {
            self.session.refresh()?
        };

        let months = views::months(&prepared.clean);
        let regions = views::regions(&prepared.clean);
        self.control_panel.update_available(months, regions);

        let settings = &self.control_panel.settings;
        let config = self.session.config();
        let trend = if settings.trend_closed {
            None
        } else {
            StatsCalculator::fit_monthly_trend(&prepared.monthly)
        };
        let breakdowns = StatsCalculator::top_crime_types_by_region(
            &prepared.clean,
            &settings.selected_regions,
            config.top_n,
        );

        let status = format!(
            "{} crimes in {} regions",
            prepared.clean.len(),
            prepared.regional.len()
        );
        self.chart_viewer
            .set_data(prepared, trend, breakdowns, config.significance_level);
        Ok(status)
    }
}

impl eframe::App for CrimeDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::SettingsChanged => self.refresh(false),
                        ControlPanelAction::Reload => self.refresh(true),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui, &self.control_panel.settings);
        });
    }
}
