use std::ops::RangeInclusive;

use eframe::egui::{Color32, ComboBox, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot};

use crate::color::CategoryColors;
use crate::data::aggregate::{AgeHistogram, AggregateViews, StageCount, SummaryStats};
use crate::data::model::SiteSelection;
use crate::state::AppState;

// Chart series colours carried over from the registry's reporting palette.
const AGE_COLOR: Color32 = Color32::from_rgb(0x72, 0xb7, 0xb2);
const SITE_COLOR: Color32 = Color32::from_rgb(0x4c, 0x78, 0xa8);
const STAGE_COLOR: Color32 = Color32::from_rgb(0xe1, 0x57, 0x59);

const CHART_HEIGHT: f32 = 240.0;

// ---------------------------------------------------------------------------
// Central panel – the dashboard
// ---------------------------------------------------------------------------

/// Render every aggregate view. Each chart handles its own empty state; an
/// empty chart never suppresses the others.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if state.registry.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a registry file to begin  (File → Open…)");
        });
        return;
    }

    let Some(views) = state.views.clone() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data matches current filters. Please adjust your selection.");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Demographic Composition");
            ui.columns(2, |cols: &mut [Ui]| {
                demographics_chart(&mut cols[0], &views);
                age_chart(&mut cols[1], &views.age_hist);
            });

            ui.separator();

            ui.heading("Tumor Site & Stage");
            ui.columns(2, |cols: &mut [Ui]| {
                sites_chart(&mut cols[0], &views);
                stage_section(&mut cols[1], state, &views);
            });

            ui.separator();

            ui.heading("Summary Statistics");
            summary_strip(ui, &views.summary);
        });
}

// ---------------------------------------------------------------------------
// Individual charts
// ---------------------------------------------------------------------------

/// Top race × ethnicity combinations, one bar per combination, coloured by
/// ethnicity.
fn demographics_chart(ui: &mut Ui, views: &AggregateViews) {
    ui.strong("Top Race / Ethnicity Combinations");
    if views.demographics.is_empty() {
        ui.label("No demographic data available.");
        return;
    }

    let colors = CategoryColors::new(views.demographics.iter().map(|d| d.ethnicity.as_str()));
    let labels: Vec<String> = views.demographics.iter().map(|d| d.race.clone()).collect();

    // One chart per ethnicity so the legend lists ethnicities, matching the
    // colour encoding.
    let mut charts: Vec<BarChart> = Vec::new();
    for (ethnicity, color) in colors.legend_entries() {
        let bars: Vec<Bar> = views
            .demographics
            .iter()
            .enumerate()
            .filter(|(_, d)| d.ethnicity == ethnicity)
            .map(|(i, d)| Bar::new(i as f64, d.count as f64).width(0.6))
            .collect();
        if !bars.is_empty() {
            charts.push(BarChart::new(bars).color(color).name(&ethnicity));
        }
    }

    Plot::new("demographics_chart")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .y_axis_label("Patients")
        .x_axis_formatter(category_labels(labels))
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

/// Age-at-diagnosis histogram.
fn age_chart(ui: &mut Ui, hist: &AgeHistogram) {
    ui.strong("Age Distribution");
    if hist.is_empty() {
        ui.label("No age data available.");
        return;
    }

    let bars: Vec<Bar> = hist
        .counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let center = (hist.edges[i] + hist.edges[i + 1]) / 2.0;
            let width = hist.edges[i + 1] - hist.edges[i];
            Bar::new(center, count as f64).width(width * 0.95)
        })
        .collect();

    Plot::new("age_chart")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .x_axis_label("Age")
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(AGE_COLOR).name("Patients"));
        });
}

/// Most frequent primary sites.
fn sites_chart(ui: &mut Ui, views: &AggregateViews) {
    ui.strong("Primary Sites");
    if views.sites.is_empty() {
        ui.label("No site data available.");
        return;
    }

    let labels: Vec<String> = views.sites.iter().map(|s| s.site.clone()).collect();
    let bars: Vec<Bar> = views
        .sites
        .iter()
        .enumerate()
        .map(|(i, s)| Bar::new(i as f64, s.count as f64).width(0.6))
        .collect();

    Plot::new("sites_chart")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .y_axis_label("Patients")
        .x_axis_formatter(category_labels(labels))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(SITE_COLOR).name("Patients"));
        });
}

/// Stage breakdown with its site-scope selector.
fn stage_section(ui: &mut Ui, state: &mut AppState, views: &AggregateViews) {
    ui.strong("Stage Distribution for Selected Site");

    // Site selector: "All" plus the currently ranked sites.
    let current = state.site_selection.clone();
    ComboBox::from_id_salt("site_select")
        .selected_text(current.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            if ui
                .selectable_label(current == SiteSelection::All, "All")
                .clicked()
            {
                state.set_site_selection(SiteSelection::All);
            }
            for s in &views.sites {
                let selection = SiteSelection::Site(s.site.clone());
                if ui
                    .selectable_label(current == selection, &s.site)
                    .clicked()
                {
                    state.set_site_selection(selection);
                }
            }
        });

    if state.stage_view.is_empty() {
        ui.label("No stage data available for selected site.");
        return;
    }

    stage_chart(ui, &state.stage_view);
}

fn stage_chart(ui: &mut Ui, stages: &[StageCount]) {
    let labels: Vec<String> = stages.iter().map(|s| s.stage.clone()).collect();
    let bars: Vec<Bar> = stages
        .iter()
        .enumerate()
        .map(|(i, s)| Bar::new(i as f64, s.count as f64).width(0.6))
        .collect();

    Plot::new("stage_chart")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .y_axis_label("Patients")
        .x_axis_formatter(category_labels(labels))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(STAGE_COLOR).name("Patients"));
        });
}

/// Headline metric strip.
fn summary_strip(ui: &mut Ui, summary: &SummaryStats) {
    ui.columns(4, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Total Patients", summary.total.to_string());
        metric(&mut cols[1], "Unique Sites", summary.unique_sites.to_string());
        metric(&mut cols[2], "Stages Represented", summary.unique_stages.to_string());
        let mean = summary
            .mean_age
            .map(|a| format!("{a:.1}"))
            .unwrap_or_else(|| "—".to_string());
        metric(&mut cols[3], "Avg Age at Diagnosis", mean);
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(label);
        ui.label(RichText::new(value).heading());
    });
}

/// Axis formatter that shows category labels at integer grid marks and
/// nothing elsewhere.
fn category_labels(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let i = mark.value.round();
        if (mark.value - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < labels.len() {
            labels[i as usize].clone()
        } else {
            String::new()
        }
    }
}
