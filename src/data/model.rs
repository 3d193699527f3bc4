use std::collections::BTreeSet;
use std::fmt;

/// Sentinel used by registry exports for a categorical value that was not
/// recorded. Treated as "present but unusable": it passes through filtering
/// like any other value but is excluded from rankings and option lists.
pub const UNKNOWN: &str = "Unknown";

// ---------------------------------------------------------------------------
// PatientRecord – one row of the registry table
// ---------------------------------------------------------------------------

/// A single de-identified registry row. Rows carry no identity and are
/// independent of each other.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    pub race: String,
    pub ethnicity: String,
    pub gender: String,
    /// Age at diagnosis. `None` when the export had no value.
    pub age: Option<f64>,
    /// Primary anatomical site.
    pub site: String,
    /// Clinical stage.
    pub stage: String,
}

// ---------------------------------------------------------------------------
// AgeBracket – the single numeric filter
// ---------------------------------------------------------------------------

/// Age-group filter. The three non-`All` brackets partition every
/// non-missing age: ≤45, (45, 65], >65.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgeBracket {
    #[default]
    All,
    Young,
    Adult,
    Senior,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 4] = [
        AgeBracket::All,
        AgeBracket::Young,
        AgeBracket::Adult,
        AgeBracket::Senior,
    ];

    /// Whether a row with the given age passes this bracket.
    /// Missing ages satisfy no numeric comparison, so every bracket other
    /// than `All` rejects them.
    pub fn matches(&self, age: Option<f64>) -> bool {
        match self {
            AgeBracket::All => true,
            AgeBracket::Young => matches!(age, Some(a) if a <= 45.0),
            AgeBracket::Adult => matches!(age, Some(a) if a > 45.0 && a <= 65.0),
            AgeBracket::Senior => matches!(age, Some(a) if a > 65.0),
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgeBracket::All => "All Ages",
            AgeBracket::Young => "Young (0-45)",
            AgeBracket::Adult => "Adult (45-65)",
            AgeBracket::Senior => "Senior (65+)",
        };
        write!(f, "{label}")
    }
}

// ---------------------------------------------------------------------------
// SiteSelection – scope of the stage-breakdown view
// ---------------------------------------------------------------------------

/// Which rows the stage breakdown covers: the whole filtered set, or a
/// single anatomical site. Independent of the filter criteria.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SiteSelection {
    #[default]
    All,
    Site(String),
}

impl fmt::Display for SiteSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteSelection::All => write!(f, "All"),
            SiteSelection::Site(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full in-memory registry with pre-computed filter option lists.
/// Immutable after construction; filtering and aggregation only read it.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// All rows, in source order.
    pub records: Vec<PatientRecord>,
    /// Sorted race values offered as filter options (no `Unknown`).
    pub race_options: BTreeSet<String>,
    /// Sorted ethnicity values offered as filter options (no `Unknown`).
    pub ethnicity_options: BTreeSet<String>,
    /// Sorted gender values offered as filter options (no `Unknown`).
    pub gender_options: BTreeSet<String>,
}

impl Registry {
    /// Build option lists from the loaded rows. The `Unknown` sentinel is
    /// never offered as a selectable option.
    pub fn from_records(records: Vec<PatientRecord>) -> Self {
        let mut race_options = BTreeSet::new();
        let mut ethnicity_options = BTreeSet::new();
        let mut gender_options = BTreeSet::new();

        for rec in &records {
            if rec.race != UNKNOWN {
                race_options.insert(rec.race.clone());
            }
            if rec.ethnicity != UNKNOWN {
                ethnicity_options.insert(rec.ethnicity.clone());
            }
            if rec.gender != UNKNOWN {
                gender_options.insert(rec.gender.clone());
            }
        }

        Registry {
            records,
            race_options,
            ethnicity_options,
            gender_options,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
