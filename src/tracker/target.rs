//! A single manually selected target and its per-frame bookkeeping.

use serde::{Deserialize, Serialize};

use crate::config::TrackingConfig;
use crate::error::TrackingError;
use crate::geometry::Rect;
use crate::tracker::backend::{Frame, TrackingBackend};
use crate::tracker::target_state::TargetStatus;

/// Unique target identifier within one session. Allocated from 1 upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub u64);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// RGB color tag used when drawing a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const PALETTE: [Color; 10] = [
    Color { r: 255, g: 0, b: 0 },
    Color { r: 0, g: 255, b: 0 },
    Color { r: 0, g: 0, b: 255 },
    Color { r: 255, g: 255, b: 0 },
    Color { r: 255, g: 0, b: 255 },
    Color { r: 0, g: 255, b: 255 },
    Color { r: 255, g: 165, b: 0 },
    Color { r: 128, g: 0, b: 128 },
    Color { r: 255, g: 192, b: 203 },
    Color { r: 0, g: 128, b: 0 },
];

impl Color {
    /// Palette color for `id`, cycling through ten fixed colors.
    pub fn for_target(id: TargetId) -> Self {
        PALETTE[(id.0 % PALETTE.len() as u64) as usize]
    }
}

/// Single tracked person.
pub struct Target {
    /// Unique target identifier
    pub id: TargetId,
    /// Last accepted bounding box
    pub bbox: Rect,
    /// Current lifecycle state
    pub status: TargetStatus,
    /// Drawing color
    pub color: Color,
    /// Failed frames since the last accepted box
    pub consecutive_failures: u32,
    /// Frame index of the manual selection
    pub start_frame: u64,
    /// Frame index of the last accepted box
    pub last_seen_frame: u64,
    backend: Option<Box<dyn TrackingBackend>>,
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("id", &self.id)
            .field("bbox", &self.bbox)
            .field("status", &self.status)
            .field("consecutive_failures", &self.consecutive_failures)
            .field("start_frame", &self.start_frame)
            .field("last_seen_frame", &self.last_seen_frame)
            .finish_non_exhaustive()
    }
}

impl Target {
    /// Create a target whose backend was already initialized on `bbox`.
    pub(crate) fn new(
        id: TargetId,
        bbox: Rect,
        backend: Box<dyn TrackingBackend>,
        frame_index: u64,
    ) -> Self {
        Self {
            id,
            bbox,
            status: TargetStatus::Tracking,
            color: Color::for_target(id),
            consecutive_failures: 0,
            start_frame: frame_index,
            last_seen_frame: frame_index,
            backend: Some(backend),
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.status == TargetStatus::Tracking
    }

    /// Advance the backend by one frame.
    ///
    /// A missing, degenerate or off-frame box counts as a failed frame. The
    /// target turns Lost on the failure that reaches `loss_threshold`.
    pub(crate) fn step(
        &mut self,
        frame: &Frame<'_>,
        config: &TrackingConfig,
    ) -> Result<Rect, TrackingError> {
        let observed = self
            .backend
            .as_mut()
            .and_then(|backend| backend.update(frame))
            .filter(|bbox| {
                !bbox.is_degenerate(config.min_box_area)
                    && bbox.center_within(frame.width, frame.height)
            });

        match observed {
            Some(bbox) => {
                self.bbox = bbox;
                self.consecutive_failures = 0;
                self.last_seen_frame = frame.index;
                Ok(bbox)
            }
            None => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= config.loss_threshold.max(1) {
                    self.mark_lost();
                    Err(TrackingError::PermanentLoss {
                        target: self.id,
                        consecutive_failures: self.consecutive_failures,
                    })
                } else {
                    Err(TrackingError::TrackingLoss {
                        target: self.id,
                        consecutive_failures: self.consecutive_failures,
                    })
                }
            }
        }
    }

    /// Swap in a freshly initialized backend and resume tracking from `bbox`.
    pub(crate) fn reseed(&mut self, backend: Box<dyn TrackingBackend>, bbox: Rect, frame_index: u64) {
        self.backend = Some(backend);
        self.bbox = bbox;
        self.status = TargetStatus::Tracking;
        self.consecutive_failures = 0;
        self.last_seen_frame = frame_index;
    }

    pub(crate) fn mark_lost(&mut self) {
        self.status = TargetStatus::Lost;
    }

    pub(crate) fn mark_stopped(&mut self) {
        self.status = TargetStatus::Stopped;
        self.backend = None;
    }
}
