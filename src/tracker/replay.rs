//! Backend that plays back tracker output recorded from an earlier run.
//!
//! A script lists, per target, the box seen on each frame. Frames that are
//! absent or carry `null` replay as a lost subject.
//!
//! ```json
//! {
//!   "format": "tlwh",
//!   "targets": [
//!     { "track": [ { "frame": 0, "box": [10, 10, 20, 40] },
//!                  { "frame": 1, "box": null } ] }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::geometry::{BoxBuilder, BoxFormat, Rect};
use crate::tracker::backend::{BackendFactory, Frame, TrackingBackend};
use crate::tracker::TargetId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayEntry {
    pub frame: u64,
    #[serde(rename = "box")]
    pub bbox: Option<[f64; 4]>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplayTrack {
    pub track: Vec<ReplayEntry>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub format: BoxFormat,
    pub targets: Vec<ReplayTrack>,
}

impl ReplayScript {
    /// Per-target boxes keyed by frame index, in script order.
    pub fn tracks(&self) -> Vec<BTreeMap<u64, Rect>> {
        self.targets
            .iter()
            .map(|target| {
                target
                    .track
                    .iter()
                    .filter_map(|entry| {
                        entry
                            .bbox
                            .map(|raw| (entry.frame, BoxBuilder::new().raw(self.format, raw).build()))
                    })
                    .collect()
            })
            .collect()
    }

    /// First recorded `(frame, box)` of each target: where the operator selected it.
    pub fn selections(&self) -> Vec<Option<(u64, Rect)>> {
        self.tracks()
            .into_iter()
            .map(|boxes| boxes.into_iter().next())
            .collect()
    }

    /// Tracks reordered by selection frame, dropping tracks without any box.
    ///
    /// Starting targets in this order makes the session hand out ids that
    /// match [`ReplayFactory`]'s numbering.
    pub fn in_selection_order(&self) -> Self {
        let selections = self.selections();
        let mut order: Vec<(u64, usize)> = selections
            .iter()
            .enumerate()
            .filter_map(|(i, sel)| sel.map(|(frame, _)| (frame, i)))
            .collect();
        order.sort();

        Self {
            format: self.format,
            targets: order
                .into_iter()
                .map(|(_, i)| self.targets[i].clone())
                .collect(),
        }
    }

    /// Lowest and highest frame index mentioned anywhere in the script.
    pub fn frame_span(&self) -> Option<(u64, u64)> {
        let frames = self.targets.iter().flat_map(|t| t.track.iter().map(|e| e.frame));
        let (min, max) = frames.fold((u64::MAX, u64::MIN), |(lo, hi), f| (lo.min(f), hi.max(f)));
        (min <= max).then_some((min, max))
    }
}

pub struct ReplayBackend {
    boxes: BTreeMap<u64, Rect>,
    seeded: bool,
}

impl ReplayBackend {
    pub fn new(boxes: BTreeMap<u64, Rect>) -> Self {
        Self {
            boxes,
            seeded: false,
        }
    }
}

impl TrackingBackend for ReplayBackend {
    fn init(&mut self, _frame: &Frame<'_>, _bbox: Rect) -> Result<(), BackendError> {
        self.seeded = true;
        Ok(())
    }

    fn update(&mut self, frame: &Frame<'_>) -> Option<Rect> {
        if !self.seeded {
            return None;
        }
        self.boxes.get(&frame.index).copied()
    }
}

/// Hands the n-th script track to target `n + 1`, matching the order in
/// which the session allocates ids.
pub struct ReplayFactory {
    tracks: BTreeMap<TargetId, BTreeMap<u64, Rect>>,
}

impl ReplayFactory {
    pub fn new(script: &ReplayScript) -> Self {
        let tracks = script
            .tracks()
            .into_iter()
            .enumerate()
            .map(|(i, boxes)| (TargetId(i as u64 + 1), boxes))
            .collect();
        Self { tracks }
    }
}

impl BackendFactory for ReplayFactory {
    fn create(&self, target: TargetId) -> Result<Box<dyn TrackingBackend>, BackendError> {
        let boxes = self
            .tracks
            .get(&target)
            .ok_or_else(|| BackendError::Unavailable(format!("no recorded track for {target}")))?;
        Ok(Box::new(ReplayBackend::new(boxes.clone())))
    }
}
