use std::path::PathBuf;

use eframe::egui;

use crate::state::AppState;
use crate::ui::{dashboard, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct OncoDashApp {
    pub state: AppState,
}

impl OncoDashApp {
    /// Create the app, loading the given registry file up front if one was
    /// passed on the command line. A load failure becomes a status message,
    /// not a crash.
    pub fn new(initial_registry: Option<PathBuf>) -> Self {
        let mut state = AppState::default();
        if let Some(path) = initial_registry {
            panels::load_registry(&mut state, &path);
        }
        Self { state }
    }
}

impl eframe::App for OncoDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: aggregate charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard::dashboard(ui, &mut self.state);
        });
    }
}
