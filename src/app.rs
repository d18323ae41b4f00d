use eframe::egui;

use crate::config::DashboardConfig;
use crate::state::AppState;
use crate::ui::{panels, plot, report};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct AirQualityApp {
    pub state: AppState,
}

impl AirQualityApp {
    pub fn new(config: DashboardConfig) -> Self {
        let mut state = AppState::new(config);
        state.load_default();
        Self { state }
    }
}

impl eframe::App for AirQualityApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: toggles + imputation summary ----
        egui::SidePanel::left("control_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts and conclusion ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.heading("Air Quality in Changping");
                    ui.add_space(8.0);

                    let Some(analysis) = &self.state.analysis else {
                        ui.label("Open a PRSA station file to start  (File → Open…)");
                        return;
                    };

                    if self.state.show_before {
                        plot::boxplot_grid(
                            ui,
                            "Boxplots before outlier imputation",
                            "before",
                            &self.state.config.boxplot_columns,
                            &analysis.boxes_before,
                        );
                    }
                    if self.state.show_after {
                        plot::boxplot_grid(
                            ui,
                            "Boxplots after outlier imputation",
                            "after",
                            &self.state.config.boxplot_columns,
                            &analysis.boxes_after,
                        );
                    }

                    plot::seasonal_trend(ui, &analysis.quarterly);
                    ui.add_space(12.0);
                    plot::correlation_heatmap(ui, &analysis.correlation);
                    ui.add_space(12.0);
                    report::conclusion(ui);
                });
        });
    }
}
