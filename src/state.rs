use std::collections::BTreeSet;

use crate::data::aggregate::{stage_breakdown, AggregateViews, StageCount};
use crate::data::filter::{filtered_indices, FilterCriteria};
use crate::data::model::{AgeBracket, Registry, SiteSelection};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which categorical attribute a filter widget edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Race,
    Ethnicity,
    Gender,
}

impl Attribute {
    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Race => "Race",
            Attribute::Ethnicity => "Ethnicity",
            Attribute::Gender => "Gender",
        }
    }
}

/// The full UI state, independent of rendering. Everything the dashboard
/// shows derives from this struct; nothing is read from ambient widget
/// state.
#[derive(Default)]
pub struct AppState {
    /// Loaded registry (None until a file is loaded).
    pub registry: Option<Registry>,

    /// Current filter criteria.
    pub criteria: FilterCriteria,

    /// Indices of rows passing the current criteria (cached).
    pub visible: Vec<usize>,

    /// Criteria-dependent aggregate views; `None` when the filtered set is
    /// empty, which the dashboard renders as a single "adjust filters"
    /// message.
    pub views: Option<AggregateViews>,

    /// Site scope of the stage-breakdown chart.
    pub site_selection: SiteSelection,

    /// Stage counts for the current site selection. Recomputed on its own
    /// so changing the site does not touch the other views.
    pub stage_view: Vec<StageCount>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl AppState {
    /// Ingest a newly loaded registry and reset all interaction state.
    pub fn set_registry(&mut self, registry: Registry) {
        self.criteria = FilterCriteria::default();
        self.site_selection = SiteSelection::All;
        self.registry = Some(registry);
        self.status_message = None;
        self.loading = false;
        self.refilter();
    }

    /// Recompute the filtered set and every criteria-dependent view.
    pub fn refilter(&mut self) {
        let Some(registry) = &self.registry else {
            self.visible.clear();
            self.views = None;
            self.stage_view.clear();
            return;
        };

        self.visible = filtered_indices(registry, &self.criteria);
        if self.visible.is_empty() {
            self.views = None;
            self.stage_view.clear();
            return;
        }

        let views = AggregateViews::compute(registry, &self.visible);

        // A previously selected site may have dropped out of the ranking.
        if let SiteSelection::Site(site) = &self.site_selection {
            if !views.sites.iter().any(|s| s.site == *site) {
                self.site_selection = SiteSelection::All;
            }
        }

        self.views = Some(views);
        self.restage();
    }

    /// Change the stage-breakdown scope. Only the stage view is recomputed.
    pub fn set_site_selection(&mut self, selection: SiteSelection) {
        if self.site_selection != selection {
            self.site_selection = selection;
            self.restage();
        }
    }

    fn restage(&mut self) {
        if let Some(registry) = &self.registry {
            self.stage_view = stage_breakdown(registry, &self.visible, &self.site_selection);
        }
    }

    fn selection_mut(&mut self, attribute: Attribute) -> &mut BTreeSet<String> {
        match attribute {
            Attribute::Race => &mut self.criteria.races,
            Attribute::Ethnicity => &mut self.criteria.ethnicities,
            Attribute::Gender => &mut self.criteria.genders,
        }
    }

    /// Option list for an attribute's filter widget.
    pub fn options(&self, attribute: Attribute) -> BTreeSet<String> {
        let Some(registry) = &self.registry else {
            return BTreeSet::new();
        };
        match attribute {
            Attribute::Race => registry.race_options.clone(),
            Attribute::Ethnicity => registry.ethnicity_options.clone(),
            Attribute::Gender => registry.gender_options.clone(),
        }
    }

    /// Toggle one value in an attribute's selection.
    pub fn toggle_value(&mut self, attribute: Attribute, value: &str) {
        let selected = self.selection_mut(attribute);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select every offered value for an attribute.
    pub fn select_all(&mut self, attribute: Attribute) {
        let options = self.options(attribute);
        *self.selection_mut(attribute) = options;
        self.refilter();
    }

    /// Clear an attribute's selection, which means "no restriction".
    pub fn select_none(&mut self, attribute: Attribute) {
        self.selection_mut(attribute).clear();
        self.refilter();
    }

    /// Change the age bracket.
    pub fn set_age_bracket(&mut self, bracket: AgeBracket) {
        if self.criteria.age_bracket != bracket {
            self.criteria.age_bracket = bracket;
            self.refilter();
        }
    }
}
