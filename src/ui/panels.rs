use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::AgeBracket;
use crate::state::{AppState, Attribute};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.registry.is_none() {
        ui.label("No registry loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Per-attribute multi-select filters (collapsible) ----
            for attribute in [Attribute::Race, Attribute::Ethnicity, Attribute::Gender] {
                attribute_filter(ui, state, attribute);
            }

            ui.separator();

            // ---- Age bracket ----
            ui.strong("Age Group");
            let current = state.criteria.age_bracket;
            egui::ComboBox::from_id_salt("age_bracket")
                .selected_text(current.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for bracket in AgeBracket::ALL {
                        if ui
                            .selectable_label(current == bracket, bracket.to_string())
                            .clicked()
                        {
                            state.set_age_bracket(bracket);
                        }
                    }
                });

            ui.separator();

            // ---- Live counter ----
            ui.label("Patients in View");
            ui.strong(state.visible.len().to_string());
        });
}

/// One collapsible checkbox filter for a categorical attribute. An empty
/// selection applies no restriction, so the header says so.
fn attribute_filter(ui: &mut Ui, state: &mut AppState, attribute: Attribute) {
    let options = state.options(attribute);
    let n_selected = match attribute {
        Attribute::Race => state.criteria.races.len(),
        Attribute::Ethnicity => state.criteria.ethnicities.len(),
        Attribute::Gender => state.criteria.genders.len(),
    };
    let header_text = if n_selected == 0 {
        format!("{}  (all)", attribute.label())
    } else {
        format!("{}  ({n_selected}/{})", attribute.label(), options.len())
    };

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(attribute.label())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(attribute);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(attribute);
                }
            });

            for value in &options {
                let selected = match attribute {
                    Attribute::Race => state.criteria.races.contains(value),
                    Attribute::Ethnicity => state.criteria.ethnicities.contains(value),
                    Attribute::Gender => state.criteria.genders.contains(value),
                };
                let mut checked = selected;
                if ui.checkbox(&mut checked, value).changed() {
                    state.toggle_value(attribute, value);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(registry) = &state.registry {
            ui.label(format!(
                "{} patients loaded, {} in view",
                registry.len(),
                state.visible.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open clinical registry")
        .add_filter("Supported files", &["csv", "tsv", "json", "parquet", "pq"])
        .add_filter("CSV / TSV", &["csv", "tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        load_registry(state, &path);
    }
}

/// Load a registry file into the state, turning failures into a status
/// message instead of propagating them.
pub fn load_registry(state: &mut AppState, path: &std::path::Path) {
    match crate::data::loader::load_file(path) {
        Ok(registry) => {
            log::info!(
                "Loaded {} patient records from {}",
                registry.len(),
                path.display()
            );
            state.set_registry(registry);
        }
        Err(e) => {
            log::error!("Failed to load registry: {e}");
            state.status_message = Some(format!("Error: {e}"));
            state.loading = false;
        }
    }
}
