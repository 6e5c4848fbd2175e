use serde::{Deserialize, Serialize};

use crate::layout::SectionId;
use crate::tracker::TargetId;

/// When a target was seen: the frame index and its timestamp in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub frame_index: u64,
    pub timestamp: f64,
}

impl Observation {
    pub fn new(frame_index: u64, timestamp: f64) -> Self {
        Self {
            frame_index,
            timestamp,
        }
    }
}

/// A confirmed stay of one target inside one section.
///
/// `exit_*` stay `None` while the visit is open. Once closed an event is
/// never modified again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitEvent {
    pub target: TargetId,
    pub section: SectionId,
    pub enter_frame: u64,
    pub enter_time: f64,
    pub exit_frame: Option<u64>,
    pub exit_time: Option<f64>,
}

impl VisitEvent {
    pub(crate) fn open(target: TargetId, section: SectionId, entered: Observation) -> Self {
        Self {
            target,
            section,
            enter_frame: entered.frame_index,
            enter_time: entered.timestamp,
            exit_frame: None,
            exit_time: None,
        }
    }

    pub(crate) fn close(&mut self, exit: Observation) {
        self.exit_frame = Some(exit.frame_index);
        self.exit_time = Some(exit.timestamp);
    }

    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Seconds between entry and exit; `None` while open.
    pub fn dwell(&self) -> Option<f64> {
        self.exit_time.map(|exit| exit - self.enter_time)
    }

    /// Dwell, treating an open visit as ending at `now`.
    pub fn dwell_until(&self, now: f64) -> f64 {
        self.exit_time.unwrap_or(now) - self.enter_time
    }

    /// Copy of the event as it would read if it were closed at `now`.
    pub fn as_of(&self, now: Observation) -> Self {
        let mut event = self.clone();
        if event.is_open() {
            event.close(now);
        }
        event
    }
}
