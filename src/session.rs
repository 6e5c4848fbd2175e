//! One tracking session: targets, trails, visits and the installed layout.
//!
//! `Session` owns all mutable state. Every mutation takes `&mut self`, so a
//! frame pass is never interleaved with adding, re-seeding or stopping a
//! target, or with installing a new layout.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsSnapshot;
use crate::assignment::{assign_chain, assign_frame};
use crate::config::SessionConfig;
use crate::error::{Result, TrackingError};
use crate::geometry::{Rect, Vertex};
use crate::layout::{SectionForest, SectionId, SectionRecord};
use crate::path::{PathStore, Point};
use crate::tracker::{
    BackendFactory, Color, Frame, TargetId, TargetStatus, TrackResult, TrackerManager,
};
use crate::visits::{Observation, VisitAnalyzer, VisitEvent, VisitUpdate};

/// What one frame pass produced.
#[derive(Debug)]
pub struct FrameReport {
    pub frame_index: u64,
    pub timestamp: f64,
    /// Per Tracking target: the new box, or the loss it reported
    pub tracking: BTreeMap<TargetId, TrackResult>,
    /// Section chain (innermost first) of every target that produced a point
    pub assignments: BTreeMap<TargetId, Vec<SectionId>>,
    pub visits: Vec<VisitUpdate>,
}

/// Draw data for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub target: TargetId,
    pub bbox: Rect,
    pub color: Color,
    pub status: TargetStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub id: TargetId,
    pub status: TargetStatus,
    pub color: Color,
    pub bbox: Rect,
    pub start_frame: u64,
    pub last_seen_frame: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPath {
    pub target: TargetId,
    pub points: Vec<Point>,
}

/// Everything a report writer needs, detached from the live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    pub sections: Vec<SectionRecord>,
    pub targets: Vec<TargetRecord>,
    pub paths: Vec<TargetPath>,
    /// Open visits are reported as ending at the last processed frame
    pub visits: Vec<VisitEvent>,
    pub analytics: AnalyticsSnapshot,
}

/// A live tracking session over one video feed.
pub struct Session {
    config: SessionConfig,
    forest: Arc<SectionForest>,
    trackers: TrackerManager,
    paths: PathStore,
    visits: VisitAnalyzer,
    last_frame: Option<Observation>,
}

impl Session {
    /// Create a session with an empty layout.
    pub fn new(config: SessionConfig, factory: Arc<dyn BackendFactory>) -> Self {
        Self::with_layout(config, factory, SectionForest::default())
    }

    pub fn with_layout(
        config: SessionConfig,
        factory: Arc<dyn BackendFactory>,
        forest: SectionForest,
    ) -> Self {
        Self {
            trackers: TrackerManager::new(factory, config.tracking.clone()),
            visits: VisitAnalyzer::new(&config.visits),
            paths: PathStore::new(),
            forest: Arc::new(forest),
            last_frame: None,
            config,
        }
    }

    /// Replace the layout used from the next frame on.
    ///
    /// Existing visit events keep referring to the old section ids.
    pub fn install_layout(&mut self, forest: SectionForest) {
        debug!("installing layout with {} sections", forest.len());
        self.forest = Arc::new(forest);
    }

    /// Load, validate and install a layout file. On error the current
    /// layout stays in place.
    pub fn load_layout<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let forest = SectionForest::load(path, self.config.layout.max_depth)?;
        self.install_layout(forest);
        Ok(())
    }

    pub fn layout(&self) -> Arc<SectionForest> {
        Arc::clone(&self.forest)
    }

    /// Start following the subject inside `bbox`, selected on `frame`.
    ///
    /// `frame` may be the last processed frame or a later one.
    pub fn start_target(&mut self, bbox: Rect, frame: &Frame<'_>) -> Result<TargetId> {
        let at = self.check_order(frame, true)?;
        let id = self.trackers.start_target(bbox, frame)?;
        debug!("started {id} at frame {} with {bbox:?}", frame.index);

        self.record(id, bbox, at)?;
        self.advance(at);
        Ok(id)
    }

    /// Re-seed a Lost or drifting target with a manually drawn box.
    pub fn reinitialize(&mut self, id: TargetId, bbox: Rect, frame: &Frame<'_>) -> Result<()> {
        let at = self.check_order(frame, true)?;
        self.trackers.reinitialize(id, bbox, frame)?;
        debug!("re-seeded {id} at frame {} with {bbox:?}", frame.index);

        // A target that already produced a point on this frame keeps it.
        let seen_here = self
            .paths
            .tail(id, 1)
            .first()
            .is_some_and(|p| p.frame_index >= at.frame_index);
        if !seen_here {
            self.record(id, bbox, at)?;
        }
        self.advance(at);
        Ok(())
    }

    /// Stop tracking `id` and close its open visits.
    ///
    /// Visits end at the last processed frame, or at the first outside
    /// observation when an exit was already pending.
    pub fn stop_target(&mut self, id: TargetId) -> Result<Vec<VisitUpdate>> {
        self.trackers.stop_target(id)?;
        let Some(now) = self.last_frame else {
            return Ok(Vec::new());
        };
        let closed = self.visits.stop_target(id, now);
        debug!("stopped {id}, closed {} visit(s)", closed.len());
        Ok(closed)
    }

    /// Run one frame through tracking, assignment and visit analysis.
    ///
    /// Frames must arrive with strictly increasing index and timestamp; an
    /// out-of-order frame is rejected before any state changes.
    pub fn process_frame(&mut self, frame: &Frame<'_>) -> Result<FrameReport> {
        let at = self.check_order(frame, false)?;
        let forest = Arc::clone(&self.forest);

        let tracking = self.trackers.update(frame);

        let mut positions = BTreeMap::new();
        let mut lost = Vec::new();
        for (id, result) in &tracking {
            match result {
                Ok(bbox) => {
                    let point = Point::from_box(bbox, at.timestamp, at.frame_index);
                    self.paths.append(*id, point)?;
                    positions.insert(*id, point.position());
                }
                Err(err @ TrackingError::PermanentLoss { .. }) => {
                    debug!("{err}");
                    lost.push(*id);
                }
                Err(err) => trace!("{err}"),
            }
        }

        let assignments = assign_frame(positions.iter().map(|(id, p)| (*id, p)), &forest);
        let mut visits = Vec::new();
        for (id, chain) in &assignments {
            visits.extend(self.visits.observe(*id, chain, at));
        }
        // Visits of a lost target end where it was last seen
        for id in lost {
            if let Some(last) = self.paths.tail(id, 1).first() {
                let last_seen = Observation::new(last.frame_index, last.timestamp);
                visits.extend(self.visits.lose_target(id, last_seen));
            }
        }
        log_visits(&visits);

        self.advance(at);
        Ok(FrameReport {
            frame_index: at.frame_index,
            timestamp: at.timestamp,
            tracking,
            assignments,
            visits,
        })
    }

    pub fn overlays(&self) -> Vec<Overlay> {
        self.trackers
            .targets()
            .filter(|t| t.status != TargetStatus::Stopped)
            .map(|t| Overlay {
                target: t.id,
                bbox: t.bbox,
                color: t.color,
                status: t.status,
            })
            .collect()
    }

    /// The last `n` points of a target's trail, oldest first.
    pub fn path_tail(&self, id: TargetId, n: usize) -> &[Point] {
        self.paths.tail(id, n)
    }

    pub fn open_visits(&self) -> Vec<&VisitEvent> {
        self.visits.open_events().collect()
    }

    /// Analytics as of the last processed frame.
    pub fn snapshot(&self) -> AnalyticsSnapshot {
        let targets: Vec<TargetId> = self.trackers.targets().map(|t| t.id).collect();
        AnalyticsSnapshot::compute(
            &targets,
            &self.paths,
            &self.visits,
            &self.forest,
            self.last_frame,
            &self.config,
        )
    }

    pub fn export(&self) -> SessionExport {
        let visits = match self.last_frame {
            Some(now) => self.visits.events_as_of(now),
            None => self.visits.events().to_vec(),
        };
        SessionExport {
            sections: self.forest.to_records(),
            targets: self
                .trackers
                .targets()
                .map(|t| TargetRecord {
                    id: t.id,
                    status: t.status,
                    color: t.color,
                    bbox: t.bbox,
                    start_frame: t.start_frame,
                    last_seen_frame: t.last_seen_frame,
                })
                .collect(),
            paths: self
                .paths
                .paths()
                .map(|(target, points)| TargetPath {
                    target,
                    points: points.to_vec(),
                })
                .collect(),
            visits,
            analytics: self.snapshot(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn trackers(&self) -> &TrackerManager {
        &self.trackers
    }

    pub fn paths(&self) -> &PathStore {
        &self.paths
    }

    pub fn visits(&self) -> &VisitAnalyzer {
        &self.visits
    }

    pub fn last_frame(&self) -> Option<Observation> {
        self.last_frame
    }

    /// `allow_current` accepts the last processed frame again (operator
    /// input on the frame on screen).
    fn check_order(&self, frame: &Frame<'_>, allow_current: bool) -> Result<Observation> {
        let at = Observation::new(frame.index, frame.timestamp);
        let Some(last) = self.last_frame else {
            return Ok(at);
        };

        let same = frame.index == last.frame_index && frame.timestamp == last.timestamp;
        let later = frame.index > last.frame_index && frame.timestamp > last.timestamp;
        if later || (allow_current && same) {
            Ok(at)
        } else {
            Err(TrackingError::OutOfOrderTimestamp {
                target: None,
                last_frame_index: last.frame_index,
                last_timestamp: last.timestamp,
                frame_index: frame.index,
                timestamp: frame.timestamp,
            })
        }
    }

    /// Record the selection point of a freshly seeded target.
    fn record(&mut self, id: TargetId, bbox: Rect, at: Observation) -> Result<()> {
        let point = Point::from_box(&bbox, at.timestamp, at.frame_index);
        self.paths.append(id, point)?;
        let chain = assign_chain(Vertex::new(point.x, point.y), &self.forest);
        let updates = self.visits.observe(id, &chain, at);
        log_visits(&updates);
        Ok(())
    }

    fn advance(&mut self, at: Observation) {
        self.last_frame = Some(at);
    }
}

fn log_visits(updates: &[VisitUpdate]) {
    for update in updates {
        match update {
            VisitUpdate::Opened(e) => debug!(
                "{} entered {} at frame {}",
                e.target, e.section, e.enter_frame
            ),
            VisitUpdate::Closed(e) => debug!(
                "{} left {} at frame {:?} after {:?}s",
                e.target,
                e.section,
                e.exit_frame,
                e.dwell()
            ),
        }
    }
}
