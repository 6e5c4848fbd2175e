use serde::{Deserialize, Serialize};

/// Lifecycle state of a manually selected target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetStatus {
    /// Backend is following the subject and points are recorded
    #[default]
    Tracking,
    /// Too many consecutive failed frames; waits for a manual re-seed
    Lost,
    /// Tracking ended by the operator; the path is kept for reporting
    Stopped,
}
