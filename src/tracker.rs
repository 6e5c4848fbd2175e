mod backend;
mod manager;
pub mod replay;
mod target;
mod target_state;

pub use backend::{BackendFactory, Frame, TrackingBackend};
pub use manager::{TrackResult, TrackerManager};
pub use target::{Color, Target, TargetId};
pub use target_state::TargetStatus;
