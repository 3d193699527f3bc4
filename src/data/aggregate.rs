use std::collections::{HashMap, HashSet};

use super::model::{PatientRecord, Registry, SiteSelection, UNKNOWN};

// ---------------------------------------------------------------------------
// Chart-ready outputs
// ---------------------------------------------------------------------------
//
// All outputs are plain tables and scalars so the rendering layer can be
// swapped without touching this module. Every function here is pure: given
// the same registry and indices it returns the same result, and nothing is
// cached between calls.

/// One bar of the race × ethnicity breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoCount {
    pub race: String,
    pub ethnicity: String,
    pub count: usize,
}

/// One bar of the site ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteCount {
    pub site: String,
    pub count: usize,
}

/// One bar of the stage breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct StageCount {
    pub stage: String,
    pub count: usize,
}

/// Equal-width age histogram. `edges` has one more entry than `counts`;
/// both are empty when no row had a recorded age.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgeHistogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl AgeHistogram {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Headline metrics for the filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub total: usize,
    /// Distinct sites, `Unknown` excluded.
    pub unique_sites: usize,
    /// Distinct stages, `Unknown` excluded.
    pub unique_stages: usize,
    /// Mean age at diagnosis over recorded ages, rounded to one decimal.
    /// `None` when no row had a recorded age.
    pub mean_age: Option<f64>,
}

fn rows<'a>(
    registry: &'a Registry,
    indices: &'a [usize],
) -> impl Iterator<Item = &'a PatientRecord> {
    indices.iter().map(|&i| &registry.records[i])
}

/// Count occurrences of a key, preserving first-seen order, then sort by
/// count descending. The sort is stable, so ties keep encounter order.
fn counts_by<K>(items: impl Iterator<Item = K>) -> Vec<(K, usize)>
where
    K: Clone + std::hash::Hash + Eq,
{
    let mut order: Vec<(K, usize)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();
    for item in items {
        match index.get(&item) {
            Some(&pos) => order[pos].1 += 1,
            None => {
                index.insert(item.clone(), order.len());
                order.push((item, 1));
            }
        }
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

/// Top race × ethnicity combinations by patient count.
pub fn race_ethnicity_breakdown(
    registry: &Registry,
    indices: &[usize],
    top_n: usize,
) -> Vec<DemoCount> {
    let keys = rows(registry, indices).map(|r| (r.race.clone(), r.ethnicity.clone()));
    counts_by(keys)
        .into_iter()
        .take(top_n)
        .map(|((race, ethnicity), count)| DemoCount {
            race,
            ethnicity,
            count,
        })
        .collect()
}

/// Histogram over recorded ages, bucketed into at most `max_bins`
/// equal-width bins. Rows with a missing age are dropped first; if none
/// remain the result is empty and the caller skips the chart.
pub fn age_histogram(registry: &Registry, indices: &[usize], max_bins: usize) -> AgeHistogram {
    let ages: Vec<f64> = rows(registry, indices).filter_map(|r| r.age).collect();
    if ages.is_empty() || max_bins == 0 {
        return AgeHistogram::default();
    }

    let min = ages.iter().copied().fold(f64::INFINITY, f64::min);
    let max = ages.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // Degenerate span: a single bin of unit width holds everything.
    if (max - min).abs() < f64::EPSILON {
        return AgeHistogram {
            edges: vec![min, min + 1.0],
            counts: vec![ages.len()],
        };
    }

    let n_bins = max_bins.min(ages.len());
    let width = (max - min) / n_bins as f64;
    let mut counts = vec![0usize; n_bins];
    for age in &ages {
        let bin = (((age - min) / width) as usize).min(n_bins - 1);
        counts[bin] += 1;
    }
    let edges = (0..=n_bins).map(|i| min + i as f64 * width).collect();

    AgeHistogram { edges, counts }
}

/// The `top_n` most frequent anatomical sites, `Unknown` excluded, sorted
/// descending with ties in first-seen order.
pub fn top_sites(registry: &Registry, indices: &[usize], top_n: usize) -> Vec<SiteCount> {
    let keys = rows(registry, indices)
        .filter(|r| r.site != UNKNOWN)
        .map(|r| r.site.clone());
    counts_by(keys)
        .into_iter()
        .take(top_n)
        .map(|(site, count)| SiteCount { site, count })
        .collect()
}

/// Stage counts for the selected scope, `Unknown` stage excluded. An empty
/// result is a valid state the caller renders as a placeholder.
pub fn stage_breakdown(
    registry: &Registry,
    indices: &[usize],
    selection: &SiteSelection,
) -> Vec<StageCount> {
    let keys = rows(registry, indices)
        .filter(|r| match selection {
            SiteSelection::All => true,
            SiteSelection::Site(site) => r.site == *site,
        })
        .filter(|r| r.stage != UNKNOWN)
        .map(|r| r.stage.clone());
    counts_by(keys)
        .into_iter()
        .map(|(stage, count)| StageCount { stage, count })
        .collect()
}

/// Headline metrics for the filtered set.
pub fn summary_stats(registry: &Registry, indices: &[usize]) -> SummaryStats {
    let unique_sites: HashSet<&str> = rows(registry, indices)
        .filter(|r| r.site != UNKNOWN)
        .map(|r| r.site.as_str())
        .collect();
    let unique_stages: HashSet<&str> = rows(registry, indices)
        .filter(|r| r.stage != UNKNOWN)
        .map(|r| r.stage.as_str())
        .collect();

    let ages: Vec<f64> = rows(registry, indices).filter_map(|r| r.age).collect();
    let mean_age = if ages.is_empty() {
        None
    } else {
        let mean = ages.iter().sum::<f64>() / ages.len() as f64;
        Some((mean * 10.0).round() / 10.0)
    };

    SummaryStats {
        total: indices.len(),
        unique_sites: unique_sites.len(),
        unique_stages: unique_stages.len(),
        mean_age,
    }
}

// ---------------------------------------------------------------------------
// AggregateViews – everything that depends only on the filter criteria
// ---------------------------------------------------------------------------

/// The criteria-dependent views, computed together after a filter change.
/// The stage breakdown is deliberately not part of this bundle: it also
/// depends on the site selection and is recomputed on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateViews {
    pub demographics: Vec<DemoCount>,
    pub age_hist: AgeHistogram,
    pub sites: Vec<SiteCount>,
    pub summary: SummaryStats,
}

/// How many ranked rows the breakdown charts keep.
pub const TOP_N: usize = 10;

/// Upper bound on age-histogram bins.
pub const MAX_AGE_BINS: usize = 15;

impl AggregateViews {
    pub fn compute(registry: &Registry, indices: &[usize]) -> Self {
        AggregateViews {
            demographics: race_ethnicity_breakdown(registry, indices, TOP_N),
            age_hist: age_histogram(registry, indices, MAX_AGE_BINS),
            sites: top_sites(registry, indices, TOP_N),
            summary: summary_stats(registry, indices),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filtered_indices, FilterCriteria};

    fn rec(
        race: &str,
        ethnicity: &str,
        age: Option<f64>,
        site: &str,
        stage: &str,
    ) -> PatientRecord {
        PatientRecord {
            race: race.to_string(),
            ethnicity: ethnicity.to_string(),
            gender: "Female".to_string(),
            age,
            site: site.to_string(),
            stage: stage.to_string(),
        }
    }

    fn spec_registry() -> Registry {
        Registry::from_records(vec![
            rec("White", "Hispanic", Some(40.0), "Breast", "I"),
            rec("White", "Non-Hispanic", Some(70.0), "Breast", "II"),
            rec("Black", "Unknown", Some(50.0), "Lung", "Unknown"),
        ])
    }

    fn all_indices(registry: &Registry) -> Vec<usize> {
        (0..registry.len()).collect()
    }

    #[test]
    fn scenario_white_filter_feeds_sites_and_stages() {
        let registry = spec_registry();
        let mut criteria = FilterCriteria::default();
        criteria.races.insert("White".to_string());
        let indices = filtered_indices(&registry, &criteria);
        assert_eq!(indices.len(), 2);

        let sites = top_sites(&registry, &indices, 10);
        assert_eq!(sites, vec![SiteCount { site: "Breast".to_string(), count: 2 }]);

        let stages = stage_breakdown(&registry, &indices, &SiteSelection::All);
        assert_eq!(
            stages,
            vec![
                StageCount { stage: "I".to_string(), count: 1 },
                StageCount { stage: "II".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn top_sites_excludes_unknown_and_sorts_descending() {
        let registry = Registry::from_records(vec![
            rec("White", "Hispanic", None, "Unknown", "I"),
            rec("White", "Hispanic", None, "Lung", "I"),
            rec("White", "Hispanic", None, "Breast", "I"),
            rec("White", "Hispanic", None, "Lung", "I"),
        ]);
        let indices = all_indices(&registry);
        let sites = top_sites(&registry, &indices, 10);
        assert!(sites.iter().all(|s| s.site != UNKNOWN));
        for pair in sites.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
        assert_eq!(sites[0].site, "Lung");
    }

    #[test]
    fn top_sites_truncates_and_breaks_ties_by_first_seen() {
        let mut records = Vec::new();
        for i in 0..12 {
            records.push(rec("White", "Hispanic", None, &format!("Site{i:02}"), "I"));
        }
        let registry = Registry::from_records(records);
        let indices = all_indices(&registry);
        let sites = top_sites(&registry, &indices, 10);
        assert_eq!(sites.len(), 10);
        // All counts tie at 1, so encounter order decides.
        assert_eq!(sites[0].site, "Site00");
        assert_eq!(sites[9].site, "Site09");
    }

    #[test]
    fn demographics_groups_race_ethnicity_pairs() {
        let registry = spec_registry();
        let indices = all_indices(&registry);
        let demo = race_ethnicity_breakdown(&registry, &indices, 10);
        assert_eq!(demo.len(), 3);
        assert!(demo.iter().all(|d| d.count == 1));
        // Ties resolve to encounter order of the grouping key.
        assert_eq!(demo[0].race, "White");
        assert_eq!(demo[0].ethnicity, "Hispanic");
    }

    #[test]
    fn age_histogram_counts_every_recorded_age() {
        let registry = spec_registry();
        let indices = all_indices(&registry);
        let hist = age_histogram(&registry, &indices, 15);
        assert!(!hist.is_empty());
        assert!(hist.counts.len() <= 15);
        assert_eq!(hist.edges.len(), hist.counts.len() + 1);
        assert_eq!(hist.total(), 3);
    }

    #[test]
    fn age_histogram_two_ages() {
        let registry = Registry::from_records(vec![
            rec("White", "Hispanic", Some(40.0), "Breast", "I"),
            rec("White", "Hispanic", Some(70.0), "Breast", "I"),
        ]);
        let indices = all_indices(&registry);
        let hist = age_histogram(&registry, &indices, 15);
        assert!(hist.counts.len() <= 15);
        assert_eq!(hist.total(), 2);
    }

    #[test]
    fn age_histogram_without_ages_is_empty() {
        let registry = Registry::from_records(vec![
            rec("White", "Hispanic", None, "Breast", "I"),
            rec("Black", "Hispanic", None, "Lung", "II"),
        ]);
        let indices = all_indices(&registry);
        assert!(age_histogram(&registry, &indices, 15).is_empty());
    }

    #[test]
    fn age_histogram_identical_ages_collapse_to_one_bin() {
        let registry = Registry::from_records(vec![
            rec("White", "Hispanic", Some(55.0), "Breast", "I"),
            rec("Black", "Hispanic", Some(55.0), "Lung", "II"),
        ]);
        let indices = all_indices(&registry);
        let hist = age_histogram(&registry, &indices, 15);
        assert_eq!(hist.counts, vec![2]);
    }

    #[test]
    fn stage_breakdown_restricted_to_one_site() {
        let registry = spec_registry();
        let indices = all_indices(&registry);
        let selection = SiteSelection::Site("Lung".to_string());
        // The only Lung row has an Unknown stage.
        assert!(stage_breakdown(&registry, &indices, &selection).is_empty());

        let selection = SiteSelection::Site("Breast".to_string());
        let stages = stage_breakdown(&registry, &indices, &selection);
        assert_eq!(stages.len(), 2);
    }

    #[test]
    fn summary_total_matches_input_length() {
        let registry = spec_registry();
        let indices = all_indices(&registry);
        let stats = summary_stats(&registry, &indices);
        assert_eq!(stats.total, indices.len());
        assert_eq!(stats.unique_sites, 2);
        // The Unknown stage of the Lung row is not a distinct stage.
        assert_eq!(stats.unique_stages, 2);
    }

    #[test]
    fn summary_mean_age_rounds_to_one_decimal() {
        let registry = spec_registry();
        let indices = all_indices(&registry);
        let stats = summary_stats(&registry, &indices);
        // (40 + 70 + 50) / 3 = 53.333…
        assert_eq!(stats.mean_age, Some(53.3));
    }

    #[test]
    fn summary_mean_age_none_without_recorded_ages() {
        let registry = Registry::from_records(vec![
            rec("White", "Hispanic", None, "Breast", "I"),
        ]);
        let indices = all_indices(&registry);
        assert_eq!(summary_stats(&registry, &indices).mean_age, None);
    }

    #[test]
    fn views_bundle_matches_individual_calls() {
        let registry = spec_registry();
        let indices = all_indices(&registry);
        let views = AggregateViews::compute(&registry, &indices);
        assert_eq!(views.summary, summary_stats(&registry, &indices));
        assert_eq!(views.sites, top_sites(&registry, &indices, TOP_N));
        assert_eq!(
            views.demographics,
            race_ethnicity_breakdown(&registry, &indices, TOP_N)
        );
    }
}
