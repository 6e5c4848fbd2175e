//! Debounced section visits: per-(target, section) state machines and the
//! events they produce.

mod analyzer;
mod event;
mod state;

pub use analyzer::{CommonPath, VisitAnalyzer, VisitUpdate};
pub use event::{Observation, VisitEvent};
pub use state::VisitState;
