//! Read-side aggregates over visit events and paths.
//!
//! Nothing here is stored: a snapshot is recomputed from the current session
//! state every time it is requested, with open visits counted up to `now`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::layout::{SectionForest, SectionId};
use crate::path::{Heatmap, PathMetrics, PathStore};
use crate::tracker::TargetId;
use crate::visits::{CommonPath, Observation, VisitAnalyzer, VisitEvent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionPopularity {
    pub section: SectionId,
    /// `None` for sections missing from the installed layout
    pub name: Option<String>,
    pub visits: usize,
    pub unique_visitors: usize,
    /// Seconds
    pub total_dwell: f64,
    pub average_dwell: f64,
}

/// Entrance-to-checkout funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub entrance: SectionId,
    pub checkout: SectionId,
    pub tracked_targets: usize,
    /// Targets that visited the entrance
    pub entered: usize,
    /// Targets that visited both the entrance and the checkout
    pub converted: usize,
    /// `converted / tracked_targets`, `None` when nothing was tracked
    pub rate: Option<f64>,
}

/// Seconds one target spent in one section over all its visits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionDwell {
    pub section: SectionId,
    pub dwell: f64,
}

/// How one shopper moved through the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShoppingPattern {
    pub total_visits: usize,
    /// Distinct sections visited
    pub sections_visited: usize,
    /// In section id order
    pub section_dwell: Vec<SectionDwell>,
    /// Section with the longest total dwell; the lowest id wins a tie
    pub most_visited: Option<SectionId>,
    /// Share of visits that returned to an already visited section
    pub backtracking_score: f64,
}

impl ShoppingPattern {
    /// Pattern of `target` over `events`, which must already be closed at the
    /// reporting time.
    pub fn from_events(target: TargetId, events: &[VisitEvent]) -> Self {
        let mut dwell: BTreeMap<SectionId, f64> = BTreeMap::new();
        let mut total_visits = 0;
        for event in events.iter().filter(|e| e.target == target) {
            total_visits += 1;
            *dwell.entry(event.section).or_default() += event.dwell().unwrap_or(0.0);
        }

        let most_visited = dwell
            .iter()
            .fold(None, |best: Option<(SectionId, f64)>, (&section, &time)| match best {
                Some((_, best_time)) if best_time >= time => best,
                _ => Some((section, time)),
            })
            .map(|(section, _)| section);
        let sections_visited = dwell.len();
        let backtracking_score = if total_visits > 0 {
            (total_visits - sections_visited) as f64 / total_visits as f64
        } else {
            0.0
        };

        Self {
            total_visits,
            sections_visited,
            section_dwell: dwell
                .into_iter()
                .map(|(section, dwell)| SectionDwell { section, dwell })
                .collect(),
            most_visited,
            backtracking_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub target: TargetId,
    pub metrics: PathMetrics,
    pub efficiency: Option<f64>,
    pub visit_sequence: Vec<SectionId>,
    pub pattern: ShoppingPattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub as_of: Option<Observation>,
    pub popularity: Vec<SectionPopularity>,
    pub conversion: Option<Conversion>,
    pub targets: Vec<TargetSummary>,
    pub heatmap: Heatmap,
    pub common_paths: Vec<CommonPath>,
}

impl AnalyticsSnapshot {
    /// Aggregate everything known about `targets` as of `now`.
    pub fn compute(
        targets: &[TargetId],
        paths: &PathStore,
        visits: &VisitAnalyzer,
        forest: &SectionForest,
        now: Option<Observation>,
        config: &SessionConfig,
    ) -> Self {
        let events = match now {
            Some(now) => visits.events_as_of(now),
            None => visits.events().to_vec(),
        };
        let sequences = visits.sequences();

        let conversion = match (config.analytics.entrance, config.analytics.checkout) {
            (Some(entrance), Some(checkout)) => Some(conversion(
                targets.len(),
                &sequences,
                entrance,
                checkout,
            )),
            _ => None,
        };

        let summaries = targets
            .iter()
            .map(|&target| {
                let metrics = paths
                    .metrics(target, &config.paths)
                    .unwrap_or_default();
                TargetSummary {
                    target,
                    metrics,
                    efficiency: metrics.efficiency(),
                    visit_sequence: sequences.get(&target).cloned().unwrap_or_default(),
                    pattern: ShoppingPattern::from_events(target, &events),
                }
            })
            .collect();

        Self {
            as_of: now,
            popularity: section_popularity(&events, forest),
            conversion,
            targets: summaries,
            heatmap: paths.heatmap(config.analytics.heatmap_bin_size),
            common_paths: visits.common_paths(config.analytics.min_support),
        }
    }
}

/// Visits, unique visitors and dwell per section, most visited first.
///
/// Every section of `forest` is listed, visited or not. Open events must
/// already be closed at the reporting time (see [`VisitAnalyzer::events_as_of`]).
pub fn section_popularity(events: &[VisitEvent], forest: &SectionForest) -> Vec<SectionPopularity> {
    #[derive(Default)]
    struct Tally {
        visits: usize,
        visitors: BTreeSet<TargetId>,
        dwell: f64,
    }

    let mut tallies: BTreeMap<SectionId, Tally> = forest
        .sections()
        .iter()
        .map(|s| (s.id, Tally::default()))
        .collect();
    for event in events {
        let tally = tallies.entry(event.section).or_default();
        tally.visits += 1;
        tally.visitors.insert(event.target);
        tally.dwell += event.dwell().unwrap_or(0.0);
    }

    let mut popularity: Vec<SectionPopularity> = tallies
        .into_iter()
        .map(|(section, tally)| SectionPopularity {
            section,
            name: forest.name(section).map(str::to_owned),
            visits: tally.visits,
            unique_visitors: tally.visitors.len(),
            total_dwell: tally.dwell,
            average_dwell: if tally.visits > 0 {
                tally.dwell / tally.visits as f64
            } else {
                0.0
            },
        })
        .collect();
    // Stable sort keeps id order among equal counts
    popularity.sort_by(|a, b| b.visits.cmp(&a.visits));
    popularity
}

pub fn conversion(
    tracked_targets: usize,
    sequences: &BTreeMap<TargetId, Vec<SectionId>>,
    entrance: SectionId,
    checkout: SectionId,
) -> Conversion {
    let entered = sequences
        .values()
        .filter(|seq| seq.contains(&entrance))
        .count();
    let converted = sequences
        .values()
        .filter(|seq| seq.contains(&entrance) && seq.contains(&checkout))
        .count();

    Conversion {
        entrance,
        checkout,
        tracked_targets,
        entered,
        converted,
        rate: (tracked_targets > 0).then(|| converted as f64 / tracked_targets as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use crate::layout::Section;

    fn event(target: u64, section: u32, enter: f64, exit: f64) -> VisitEvent {
        VisitEvent {
            target: TargetId(target),
            section: SectionId(section),
            enter_frame: enter as u64,
            enter_time: enter,
            exit_frame: Some(exit as u64),
            exit_time: Some(exit),
        }
    }

    fn forest() -> SectionForest {
        SectionForest::new(
            vec![
                Section::new(1, "Entrance", Polygon::rectangle(0.0, 0.0, 10.0, 10.0)),
                Section::new(2, "Electronics", Polygon::rectangle(10.0, 0.0, 20.0, 10.0)),
                Section::new(3, "Checkout", Polygon::rectangle(20.0, 0.0, 30.0, 10.0)),
            ],
            4,
        )
        .unwrap()
    }

    #[test]
    fn test_section_popularity() {
        let events = vec![
            event(1, 2, 0.0, 10.0),
            event(1, 2, 20.0, 24.0),
            event(2, 2, 0.0, 4.0),
            event(2, 1, 5.0, 6.0),
        ];
        let popularity = section_popularity(&events, &forest());

        let ids: Vec<SectionId> = popularity.iter().map(|p| p.section).collect();
        assert_eq!(ids, vec![SectionId(2), SectionId(1), SectionId(3)]);

        let electronics = &popularity[0];
        assert_eq!(electronics.name.as_deref(), Some("Electronics"));
        assert_eq!(electronics.visits, 3);
        assert_eq!(electronics.unique_visitors, 2);
        assert_eq!(electronics.total_dwell, 18.0);
        assert_eq!(electronics.average_dwell, 6.0);

        assert_eq!(popularity[2].visits, 0);
        assert_eq!(popularity[2].average_dwell, 0.0);
    }

    #[test]
    fn test_shopping_pattern_with_return_visit() {
        // Shopper 1: Entrance, Electronics, Checkout, back to Electronics
        let events = vec![
            event(1, 1, 0.0, 2.0),
            event(1, 2, 2.0, 5.0),
            event(1, 3, 5.0, 9.0),
            event(1, 2, 9.0, 11.0),
            event(2, 3, 0.0, 30.0),
        ];
        let pattern = ShoppingPattern::from_events(TargetId(1), &events);

        assert_eq!(pattern.total_visits, 4);
        assert_eq!(pattern.sections_visited, 3);
        assert_eq!(
            pattern.section_dwell,
            vec![
                SectionDwell { section: SectionId(1), dwell: 2.0 },
                SectionDwell { section: SectionId(2), dwell: 5.0 },
                SectionDwell { section: SectionId(3), dwell: 4.0 },
            ]
        );
        assert_eq!(pattern.most_visited, Some(SectionId(2)));
        assert_eq!(pattern.backtracking_score, 0.25);
    }

    #[test]
    fn test_shopping_pattern_without_visits() {
        let pattern = ShoppingPattern::from_events(TargetId(3), &[event(1, 1, 0.0, 2.0)]);
        assert_eq!(pattern, ShoppingPattern::default());

        // Equal dwell goes to the lower id
        let events = vec![event(1, 3, 0.0, 2.0), event(1, 1, 2.0, 4.0)];
        let pattern = ShoppingPattern::from_events(TargetId(1), &events);
        assert_eq!(pattern.most_visited, Some(SectionId(1)));
        assert_eq!(pattern.backtracking_score, 0.0);
    }

    #[test]
    fn test_conversion() {
        let mut sequences = BTreeMap::new();
        sequences.insert(TargetId(1), vec![SectionId(1), SectionId(2), SectionId(3)]);
        sequences.insert(TargetId(2), vec![SectionId(1), SectionId(2)]);
        sequences.insert(TargetId(3), vec![SectionId(3)]);

        let c = conversion(4, &sequences, SectionId(1), SectionId(3));
        assert_eq!(c.entered, 2);
        assert_eq!(c.converted, 1);
        assert_eq!(c.rate, Some(0.25));

        let empty = conversion(0, &BTreeMap::new(), SectionId(1), SectionId(3));
        assert_eq!(empty.rate, None);
    }
}
