//! Debounce state machine for one (target, section) pair.
//!
//! ```text
//!            in              in x d
//! Outside ------> CandidateEnter ------> Inside
//!    ^                |  out               |  ^
//!    +----------------+                out |  | in
//!    |                                     v  |
//!    +---------------------------------- CandidateExit
//!                  out x d
//! ```
//!
//! `d` is the debounce length and counts the observation that started the
//! candidate run.

use crate::visits::Observation;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VisitState {
    #[default]
    Outside,
    /// Seen inside `count` times in a row, starting at `since`
    CandidateEnter { since: Observation, count: u32 },
    /// Visit confirmed and open since `entered`
    Inside { entered: Observation },
    /// Open visit, seen outside `count` times in a row starting at `since`
    CandidateExit {
        entered: Observation,
        since: Observation,
        count: u32,
    },
}

/// Confirmed change produced by one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Transition {
    Opened { entered: Observation },
    Closed { exit: Observation },
}

impl VisitState {
    /// Feed one observation and return the confirmed change, if any.
    pub(crate) fn observe(
        &mut self,
        inside: bool,
        at: Observation,
        debounce: u32,
    ) -> Option<Transition> {
        let debounce = debounce.max(1);
        let (next, transition) = match (*self, inside) {
            (Self::Outside, false) => (Self::Outside, None),
            (Self::Outside, true) => confirm_enter(at, 1, debounce),
            (Self::CandidateEnter { since, count }, true) => {
                confirm_enter(since, count + 1, debounce)
            }
            (Self::CandidateEnter { .. }, false) => (Self::Outside, None),
            (Self::Inside { entered }, true) => (Self::Inside { entered }, None),
            (Self::Inside { entered }, false) => confirm_exit(entered, at, 1, debounce),
            (Self::CandidateExit { entered, .. }, true) => (Self::Inside { entered }, None),
            (Self::CandidateExit { entered, since, count }, false) => {
                confirm_exit(entered, since, count + 1, debounce)
            }
        };
        *self = next;
        transition
    }

    /// Where an open visit would end if tracking stopped at `now`.
    ///
    /// A pending exit keeps its first outside observation.
    pub(crate) fn exit_on_stop(&self, now: Observation) -> Option<Observation> {
        match *self {
            Self::Inside { .. } => Some(now),
            Self::CandidateExit { since, .. } => Some(since),
            Self::Outside | Self::CandidateEnter { .. } => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Inside { .. } | Self::CandidateExit { .. })
    }
}

fn confirm_enter(since: Observation, count: u32, debounce: u32) -> (VisitState, Option<Transition>) {
    if count >= debounce {
        (
            VisitState::Inside { entered: since },
            Some(Transition::Opened { entered: since }),
        )
    } else {
        (VisitState::CandidateEnter { since, count }, None)
    }
}

fn confirm_exit(
    entered: Observation,
    since: Observation,
    count: u32,
    debounce: u32,
) -> (VisitState, Option<Transition>) {
    if count >= debounce {
        (VisitState::Outside, Some(Transition::Closed { exit: since }))
    } else {
        (VisitState::CandidateExit { entered, since, count }, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(frame: u64) -> Observation {
        Observation::new(frame, frame as f64)
    }

    /// Runs `signal` from frame 0 and records each confirmed change.
    fn run(signal: &[bool], debounce: u32) -> (VisitState, Vec<(u64, Transition)>) {
        let mut state = VisitState::default();
        let mut changes = Vec::new();
        for (i, &inside) in signal.iter().enumerate() {
            if let Some(t) = state.observe(inside, at(i as u64), debounce) {
                changes.push((i as u64, t));
            }
        }
        (state, changes)
    }

    #[test]
    fn test_entry_is_backdated() {
        let (state, changes) = run(&[false, true, true, true], 3);
        assert_eq!(
            changes,
            vec![(3, Transition::Opened { entered: at(1) })]
        );
        assert_eq!(state, VisitState::Inside { entered: at(1) });
    }

    #[test]
    fn test_short_blips_never_open() {
        let d = 3;
        let mut signal = vec![false, false];
        signal.extend(std::iter::repeat_n(true, d - 1));
        signal.push(false);
        signal.extend(std::iter::repeat_n(true, d - 1));
        let (state, changes) = run(&signal, d as u32);
        assert!(changes.is_empty());
        assert!(!state.is_open());
    }

    #[test]
    fn test_exit_flicker_is_absorbed() {
        // in x3, out, in, out x3
        let signal = [true, true, true, false, true, false, false, false];
        let (state, changes) = run(&signal, 3);
        assert_eq!(
            changes,
            vec![
                (2, Transition::Opened { entered: at(0) }),
                (7, Transition::Closed { exit: at(5) }),
            ]
        );
        assert_eq!(state, VisitState::Outside);
    }

    #[test]
    fn test_debounce_one_confirms_immediately() {
        let (_, changes) = run(&[true, false], 1);
        assert_eq!(
            changes,
            vec![
                (0, Transition::Opened { entered: at(0) }),
                (1, Transition::Closed { exit: at(1) }),
            ]
        );
        // Zero behaves like one
        let (_, changes) = run(&[true], 0);
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_exit_on_stop() {
        let now = at(9);
        assert_eq!(VisitState::Outside.exit_on_stop(now), None);
        assert_eq!(
            VisitState::CandidateEnter { since: at(1), count: 1 }.exit_on_stop(now),
            None
        );
        assert_eq!(VisitState::Inside { entered: at(1) }.exit_on_stop(now), Some(now));
        assert_eq!(
            VisitState::CandidateExit {
                entered: at(1),
                since: at(7),
                count: 2
            }
            .exit_on_stop(now),
            Some(at(7))
        );
    }
}
