mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::AirQualityApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Changping Air Quality",
        options,
        Box::new(|_cc| Ok(Box::new(AirQualityApp::new(config)))),
    )
}
