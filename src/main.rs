mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::OncoDashApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional registry path, loaded once at startup.
    let initial_registry: Option<PathBuf> = std::env::args().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "OncoDash – Registry Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(OncoDashApp::new(initial_registry)))),
    )
}
