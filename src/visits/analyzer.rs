//! Turns per-frame section chains into debounced visit events.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::VisitConfig;
use crate::layout::SectionId;
use crate::tracker::TargetId;
use crate::visits::state::{Transition, VisitState};
use crate::visits::{Observation, VisitEvent};

type MachineKey = (TargetId, SectionId);

/// A visit that opened or closed on the last call.
#[derive(Debug, Clone, PartialEq)]
pub enum VisitUpdate {
    Opened(VisitEvent),
    Closed(VisitEvent),
}

/// A contiguous run of sections shared by several visit sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonPath {
    pub sections: Vec<SectionId>,
    /// Number of occurrences across all targets
    pub support: usize,
}

#[derive(Debug, Clone, Default)]
pub struct VisitAnalyzer {
    debounce_frames: u32,
    /// Only machines that are not `Outside` are kept
    machines: BTreeMap<MachineKey, VisitState>,
    /// Every event in the order it was confirmed
    events: Vec<VisitEvent>,
    open: HashMap<MachineKey, usize>,
    latest: Option<Observation>,
}

impl VisitAnalyzer {
    pub fn new(config: &VisitConfig) -> Self {
        Self {
            debounce_frames: config.debounce_frames,
            ..Self::default()
        }
    }

    /// Feed the section chain `target` was located in at `at`.
    ///
    /// The target counts as inside every section of `chain` and outside
    /// every other section it has a live machine for.
    pub fn observe(
        &mut self,
        target: TargetId,
        chain: &[SectionId],
        at: Observation,
    ) -> Vec<VisitUpdate> {
        self.latest = Some(at);
        let mut updates = Vec::new();

        // Outermost first so nested events confirmed on the same frame keep
        // the enclosing section ahead of the inner one.
        for &section in chain.iter().rev() {
            self.step((target, section), true, at, &mut updates);
        }

        let departed: Vec<MachineKey> = self
            .machines_of(target)
            .filter(|(_, section)| !chain.contains(section))
            .collect();
        for key in departed {
            self.step(key, false, at, &mut updates);
        }

        updates
    }

    /// Close every open visit of `target`.
    ///
    /// Visits with a pending exit end at their first outside observation;
    /// the others end at `now`. Unconfirmed entries are dropped.
    pub fn stop_target(&mut self, target: TargetId, now: Observation) -> Vec<VisitUpdate> {
        self.close_target(target, now)
    }

    /// Reset `target` after a permanent tracking loss.
    ///
    /// Open visits end at `last_seen`, the last accepted observation, or at
    /// their first outside observation when an exit was pending. Unconfirmed
    /// entries are dropped, so a re-seeded target starts counting afresh.
    pub fn lose_target(&mut self, target: TargetId, last_seen: Observation) -> Vec<VisitUpdate> {
        self.close_target(target, last_seen)
    }

    fn close_target(&mut self, target: TargetId, now: Observation) -> Vec<VisitUpdate> {
        let keys: Vec<MachineKey> = self.machines_of(target).collect();
        let mut updates = Vec::new();
        for key in keys {
            let Some(state) = self.machines.remove(&key) else {
                continue;
            };
            if let Some(exit) = state.exit_on_stop(now) {
                if let Some(event) = self.close(key, exit) {
                    updates.push(VisitUpdate::Closed(event));
                }
            }
        }
        updates
    }

    pub fn state(&self, target: TargetId, section: SectionId) -> VisitState {
        self.machines
            .get(&(target, section))
            .copied()
            .unwrap_or_default()
    }

    /// All events, open and closed, in the order they were confirmed.
    pub fn events(&self) -> &[VisitEvent] {
        &self.events
    }

    pub fn open_events(&self) -> impl Iterator<Item = &VisitEvent> + '_ {
        self.events.iter().filter(|e| e.is_open())
    }

    pub fn closed_events(&self) -> impl Iterator<Item = &VisitEvent> + '_ {
        self.events.iter().filter(|e| !e.is_open())
    }

    /// Every event, with open ones reported as ending at `now`.
    pub fn events_as_of(&self, now: Observation) -> Vec<VisitEvent> {
        self.events.iter().map(|e| e.as_of(now)).collect()
    }

    /// Last observation fed to the analyzer.
    pub fn latest(&self) -> Option<Observation> {
        self.latest
    }

    /// Sections `target` visited, ordered by entry.
    pub fn visit_sequence(&self, target: TargetId) -> Vec<SectionId> {
        sequence(self.events.iter().filter(|e| e.target == target))
    }

    /// Seconds `target` spent in `section`, counting open visits up to the
    /// latest observation.
    pub fn time_in_section(&self, target: TargetId, section: SectionId) -> f64 {
        let now = self.latest.map_or(0.0, |o| o.timestamp);
        self.events
            .iter()
            .filter(|e| e.target == target && e.section == section)
            .map(|e| e.dwell_until(now))
            .sum()
    }

    /// Contiguous section runs of length two or more that occur at least
    /// `min_support` times across all visit sequences, most frequent first.
    pub fn common_paths(&self, min_support: usize) -> Vec<CommonPath> {
        common_paths(&self.sequences(), min_support)
    }

    /// Visit sequence of every target that has at least one event.
    pub fn sequences(&self) -> BTreeMap<TargetId, Vec<SectionId>> {
        let targets: BTreeSet<TargetId> = self.events.iter().map(|e| e.target).collect();
        targets
            .into_iter()
            .map(|t| (t, self.visit_sequence(t)))
            .collect()
    }

    fn machines_of(&self, target: TargetId) -> impl Iterator<Item = MachineKey> + '_ {
        self.machines
            .range((target, SectionId(u32::MIN))..=(target, SectionId(u32::MAX)))
            .map(|(key, _)| *key)
    }

    fn step(
        &mut self,
        key: MachineKey,
        inside: bool,
        at: Observation,
        updates: &mut Vec<VisitUpdate>,
    ) {
        let mut state = self.machines.get(&key).copied().unwrap_or_default();
        let transition = state.observe(inside, at, self.debounce_frames);
        if state == VisitState::Outside {
            self.machines.remove(&key);
        } else {
            self.machines.insert(key, state);
        }

        match transition {
            Some(Transition::Opened { entered }) => {
                let event = VisitEvent::open(key.0, key.1, entered);
                self.open.insert(key, self.events.len());
                self.events.push(event.clone());
                updates.push(VisitUpdate::Opened(event));
            }
            Some(Transition::Closed { exit }) => {
                if let Some(event) = self.close(key, exit) {
                    updates.push(VisitUpdate::Closed(event));
                }
            }
            None => {}
        }
    }

    fn close(&mut self, key: MachineKey, exit: Observation) -> Option<VisitEvent> {
        let idx = self.open.remove(&key)?;
        let event = self.events.get_mut(idx)?;
        event.close(exit);
        Some(event.clone())
    }
}

/// Section order of `events`, sorted by entry frame. Ties keep confirmation order.
fn sequence<'a>(events: impl Iterator<Item = &'a VisitEvent>) -> Vec<SectionId> {
    let mut events: Vec<&VisitEvent> = events.collect();
    events.sort_by_key(|e| e.enter_frame);
    events.into_iter().map(|e| e.section).collect()
}

fn common_paths(
    sequences: &BTreeMap<TargetId, Vec<SectionId>>,
    min_support: usize,
) -> Vec<CommonPath> {
    let mut counts: BTreeMap<&[SectionId], usize> = BTreeMap::new();
    for seq in sequences.values() {
        for len in 2..=seq.len() {
            for window in seq.windows(len) {
                *counts.entry(window).or_default() += 1;
            }
        }
    }

    let mut paths: Vec<CommonPath> = counts
        .into_iter()
        .filter(|&(_, support)| support >= min_support)
        .map(|(sections, support)| CommonPath {
            sections: sections.to_vec(),
            support,
        })
        .collect();
    // BTreeMap order already breaks ties by sequence
    paths.sort_by(|a, b| b.support.cmp(&a.support));
    paths
}
