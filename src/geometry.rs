//! Box and polygon geometry used by tracking and section assignment.

mod box_builder;
mod polygon;
mod rect;

pub use box_builder::{BoxBuilder, BoxFormat};
pub use polygon::{Polygon, Vertex};
pub use rect::Rect;
