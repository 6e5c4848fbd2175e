//! Error types shared by every stage of the pipeline.

use crate::geometry::Rect;
use crate::layout::SectionId;
use crate::tracker::TargetId;

/// Failure reported by a tracking backend while seeding a target.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("backend rejected initial box: {0}")]
    Rejected(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// One offending entry of a rejected layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutIssue {
    pub ids: Vec<SectionId>,
    pub reason: String,
}

impl std::fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.ids, self.reason)
    }
}

/// Everything a session operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("invalid region {bbox:?}: {reason}")]
    InvalidRegion { bbox: Rect, reason: &'static str },

    #[error("target {target} missed {consecutive_failures} consecutive frame(s)")]
    TrackingLoss {
        target: TargetId,
        consecutive_failures: u32,
    },

    #[error("target {target} lost after {consecutive_failures} consecutive failed frames")]
    PermanentLoss {
        target: TargetId,
        consecutive_failures: u32,
    },

    #[error(
        "out-of-order frame {frame_index} (t={timestamp}) after frame {last_frame_index} (t={last_timestamp})"
    )]
    OutOfOrderTimestamp {
        target: Option<TargetId>,
        last_frame_index: u64,
        last_timestamp: f64,
        frame_index: u64,
        timestamp: f64,
    },

    #[error("invalid layout, offending sections {ids:?}")]
    InvalidLayout {
        ids: Vec<SectionId>,
        issues: Vec<LayoutIssue>,
    },

    #[error("unknown target {0}")]
    UnknownTarget(TargetId),

    #[error("target {0} is stopped")]
    TargetStopped(TargetId),

    #[error("backend failure for target {target}: {source}")]
    Backend {
        target: TargetId,
        #[source]
        source: BackendError,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrackingError {
    /// Builds an `InvalidLayout` from the collected issues, listing each offending id once.
    pub fn invalid_layout(issues: Vec<LayoutIssue>) -> Self {
        let mut ids: Vec<SectionId> = issues.iter().flat_map(|i| i.ids.iter().copied()).collect();
        ids.sort();
        ids.dedup();
        Self::InvalidLayout { ids, issues }
    }

    /// Whether the pipeline absorbs this failure without surfacing it as fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::TrackingLoss { .. } | Self::PermanentLoss { .. })
    }
}

pub type Result<T> = std::result::Result<T, TrackingError>;
