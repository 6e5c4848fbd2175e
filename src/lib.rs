//! Multi-target shopper tracking and store-section visit analytics.
//!
//! A [`Session`] drives manually selected targets through a pluggable
//! [`TrackingBackend`], records their trails, maps every position onto a
//! hierarchical [`SectionForest`] and turns the result into debounced
//! [`VisitEvent`]s and an [`AnalyticsSnapshot`].
//!
//! ```ignore
//! use std::sync::Arc;
//! use visittrack_rs::{Frame, Rect, Session, SessionConfig, SectionForest};
//!
//! let mut session = Session::with_layout(
//!     SessionConfig::default(),
//!     Arc::new(|_id| make_backend()),
//!     SectionForest::default_store(640, 480),
//! );
//! let id = session.start_target(Rect::new(100.0, 80.0, 40.0, 90.0), &first_frame)?;
//! for frame in frames {
//!     let report = session.process_frame(&frame)?;
//! }
//! let export = session.export();
//! ```

pub mod analytics;
pub mod assignment;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod path;
pub mod session;
pub mod tracker;
pub mod visits;

pub use analytics::{AnalyticsSnapshot, ShoppingPattern};
pub use config::{
    AnalyticsConfig, LayoutConfig, PathConfig, SessionConfig, SmootherConfig, TrackingConfig,
    VisitConfig,
};
pub use error::{BackendError, Result, TrackingError};
pub use geometry::{BoxBuilder, BoxFormat, Polygon, Rect, Vertex};
pub use layout::{Section, SectionForest, SectionId};
pub use path::{PathMetrics, PathStore, Point};
pub use session::{FrameReport, Session, SessionExport};
pub use tracker::{BackendFactory, Frame, TargetId, TargetStatus, TrackingBackend};
pub use visits::{Observation, VisitEvent, VisitUpdate};
