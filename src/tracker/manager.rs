//! Owner of all targets in a session and driver of their per-frame updates.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::TrackingConfig;
use crate::error::{Result, TrackingError};
use crate::geometry::Rect;
use crate::tracker::backend::{BackendFactory, Frame, TrackingBackend};
use crate::tracker::target::{Target, TargetId};
use crate::tracker::target_state::TargetStatus;

/// Per-target outcome of one frame: the new box, or `TrackingLoss` / `PermanentLoss`.
pub type TrackResult = std::result::Result<Rect, TrackingError>;

pub struct TrackerManager {
    targets: BTreeMap<TargetId, Target>,
    factory: Arc<dyn BackendFactory>,
    config: TrackingConfig,
    next_id: u64,
}

impl TrackerManager {
    pub fn new(factory: Arc<dyn BackendFactory>, config: TrackingConfig) -> Self {
        Self {
            targets: BTreeMap::new(),
            factory,
            config,
            next_id: 1,
        }
    }

    /// Start following the subject inside `bbox` on `frame`.
    pub fn start_target(&mut self, bbox: Rect, frame: &Frame<'_>) -> Result<TargetId> {
        validate_region(bbox, frame)?;

        let id = TargetId(self.next_id);
        let backend = self.seed_backend(id, bbox, frame)?;
        self.next_id += 1;
        self.targets.insert(id, Target::new(id, bbox, backend, frame.index));
        Ok(id)
    }

    /// Run every Tracking target's backend on `frame`.
    ///
    /// Backends are independent, so they run on the rayon pool; the call
    /// returns once all of them have finished.
    pub fn update(&mut self, frame: &Frame<'_>) -> BTreeMap<TargetId, TrackResult> {
        let config = &self.config;
        self.targets
            .par_iter_mut()
            .filter(|(_, target)| target.is_tracking())
            .map(|(id, target)| (*id, target.step(frame, config)))
            .collect()
    }

    /// Re-seed a Lost (or drifting) target with a manually drawn box.
    pub fn reinitialize(&mut self, id: TargetId, bbox: Rect, frame: &Frame<'_>) -> Result<()> {
        match self.targets.get(&id) {
            None => return Err(TrackingError::UnknownTarget(id)),
            Some(target) if target.status == TargetStatus::Stopped => {
                return Err(TrackingError::TargetStopped(id));
            }
            Some(_) => {}
        }
        validate_region(bbox, frame)?;

        let backend = self.seed_backend(id, bbox, frame)?;
        if let Some(target) = self.targets.get_mut(&id) {
            target.reseed(backend, bbox, frame.index);
        }
        Ok(())
    }

    /// Stop tracking `id`. Stopping twice is a no-op.
    pub fn stop_target(&mut self, id: TargetId) -> Result<()> {
        let target = self
            .targets
            .get_mut(&id)
            .ok_or(TrackingError::UnknownTarget(id))?;
        target.mark_stopped();
        Ok(())
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(&id)
    }

    /// All targets ever started, in id order, whatever their status.
    pub fn targets(&self) -> impl Iterator<Item = &Target> + '_ {
        self.targets.values()
    }

    pub fn active_ids(&self) -> Vec<TargetId> {
        self.targets
            .values()
            .filter(|t| t.is_tracking())
            .map(|t| t.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    fn seed_backend(
        &self,
        id: TargetId,
        bbox: Rect,
        frame: &Frame<'_>,
    ) -> Result<Box<dyn TrackingBackend>> {
        let backend_error = |source| TrackingError::Backend { target: id, source };
        let mut backend = self.factory.create(id).map_err(backend_error)?;
        backend.init(frame, bbox).map_err(backend_error)?;
        Ok(backend)
    }
}

fn validate_region(bbox: Rect, frame: &Frame<'_>) -> Result<()> {
    if bbox.is_degenerate(0.0) {
        return Err(TrackingError::InvalidRegion {
            bbox,
            reason: "box must have positive width and height",
        });
    }
    if !bbox.lies_within(frame.width, frame.height) {
        return Err(TrackingError::InvalidRegion {
            bbox,
            reason: "box must lie within the frame",
        });
    }
    Ok(())
}
