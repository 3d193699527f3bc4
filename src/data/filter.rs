use std::collections::BTreeSet;

use super::model::{AgeBracket, Registry};

// ---------------------------------------------------------------------------
// Filter criteria: which values are selected per attribute
// ---------------------------------------------------------------------------

/// The full set of user-chosen filter criteria for one render pass.
///
/// An empty selection set means "no restriction" for that attribute, not
/// "exclude everything". This mirrors how multi-select filters behave in the
/// registry's reporting tools; do not invert it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub races: BTreeSet<String>,
    pub ethnicities: BTreeSet<String>,
    pub genders: BTreeSet<String>,
    pub age_bracket: AgeBracket,
}

impl FilterCriteria {
    /// True when no attribute restricts anything.
    pub fn is_unrestricted(&self) -> bool {
        self.races.is_empty()
            && self.ethnicities.is_empty()
            && self.genders.is_empty()
            && self.age_bracket == AgeBracket::All
    }
}

/// Return indices of rows that pass all active criteria, in original row
/// order. Pure: the registry is only read.
///
/// A row passes when, for each categorical attribute, either the selection
/// set is empty (no restriction) or the row's value is a member, and its age
/// passes the bracket. The predicates are independent, so application order
/// cannot change the result.
pub fn filtered_indices(registry: &Registry, criteria: &FilterCriteria) -> Vec<usize> {
    registry
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            set_allows(&criteria.races, &rec.race)
                && set_allows(&criteria.ethnicities, &rec.ethnicity)
                && set_allows(&criteria.genders, &rec.gender)
                && criteria.age_bracket.matches(rec.age)
        })
        .map(|(i, _)| i)
        .collect()
}

fn set_allows(selected: &BTreeSet<String>, value: &str) -> bool {
    selected.is_empty() || selected.contains(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::PatientRecord;

    fn sample_registry() -> Registry {
        let rows = [
            ("White", "Hispanic", "Female", Some(40.0), "Breast", "I"),
            ("White", "Non-Hispanic", "Female", Some(70.0), "Breast", "II"),
            ("Black", "Unknown", "Male", Some(50.0), "Lung", "Unknown"),
            ("Asian", "Non-Hispanic", "Female", None, "Lung", "III"),
        ];
        Registry::from_records(
            rows.iter()
                .map(|(r, e, g, a, s, st)| PatientRecord {
                    race: r.to_string(),
                    ethnicity: e.to_string(),
                    gender: g.to_string(),
                    age: *a,
                    site: s.to_string(),
                    stage: st.to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn empty_criteria_keeps_every_row() {
        let registry = sample_registry();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_unrestricted());
        assert_eq!(filtered_indices(&registry, &criteria), vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_race_set_is_a_no_op() {
        let registry = sample_registry();
        let mut criteria = FilterCriteria::default();
        criteria.genders.insert("Female".to_string());
        let with_empty_races = filtered_indices(&registry, &criteria);

        // Selecting every race explicitly must give the same result.
        criteria.races = registry.race_options.clone();
        let with_all_races = filtered_indices(&registry, &criteria);
        assert_eq!(with_empty_races, with_all_races);
    }

    #[test]
    fn selected_sets_are_closed_over_the_result() {
        let registry = sample_registry();
        let mut criteria = FilterCriteria::default();
        criteria.races.insert("White".to_string());
        criteria.ethnicities.insert("Hispanic".to_string());
        criteria.ethnicities.insert("Non-Hispanic".to_string());

        for idx in filtered_indices(&registry, &criteria) {
            let rec = &registry.records[idx];
            assert!(criteria.races.contains(&rec.race));
            assert!(criteria.ethnicities.contains(&rec.ethnicity));
        }
    }

    #[test]
    fn scenario_race_white_all_ages() {
        let registry = sample_registry();
        let mut criteria = FilterCriteria::default();
        criteria.races.insert("White".to_string());

        let indices = filtered_indices(&registry, &criteria);
        assert_eq!(indices, vec![0, 1]);
        for idx in indices {
            assert_eq!(registry.records[idx].race, "White");
        }
    }

    #[test]
    fn excluding_all_rows_yields_empty_not_error() {
        let registry = sample_registry();
        let mut criteria = FilterCriteria::default();
        criteria.races.insert("Pacific Islander".to_string());
        assert!(filtered_indices(&registry, &criteria).is_empty());
    }

    #[test]
    fn age_brackets_partition_rows_with_known_age() {
        let registry = sample_registry();
        let mut seen = Vec::new();
        for bracket in [AgeBracket::Young, AgeBracket::Adult, AgeBracket::Senior] {
            let criteria = FilterCriteria {
                age_bracket: bracket,
                ..FilterCriteria::default()
            };
            seen.extend(filtered_indices(&registry, &criteria));
        }
        seen.sort_unstable();
        // Row 3 has no age and belongs to no bracket; rows 0..=2 appear once.
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn filtering_is_deterministic() {
        let registry = sample_registry();
        let mut criteria = FilterCriteria::default();
        criteria.genders.insert("Female".to_string());
        criteria.age_bracket = AgeBracket::Senior;

        let first = filtered_indices(&registry, &criteria);
        let second = filtered_indices(&registry, &criteria);
        assert_eq!(first, second);
        assert_eq!(first, vec![1]);
    }

    #[test]
    fn does_not_mutate_the_registry() {
        let registry = sample_registry();
        let before = registry.records.clone();
        let mut criteria = FilterCriteria::default();
        criteria.races.insert("Black".to_string());
        let _ = filtered_indices(&registry, &criteria);
        assert_eq!(registry.records, before);
    }
}
