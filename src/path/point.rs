use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vertex};

/// Centroid of a target's box on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Seconds since the start of the video
    pub timestamp: f64,
    pub frame_index: u64,
}

impl Point {
    pub fn new(x: f64, y: f64, timestamp: f64, frame_index: u64) -> Self {
        Self {
            x,
            y,
            timestamp,
            frame_index,
        }
    }

    /// Center of `bbox`, stamped with the frame it was observed on.
    pub fn from_box(bbox: &Rect, timestamp: f64, frame_index: u64) -> Self {
        let center = bbox.center();
        Self::new(center.x, center.y, timestamp, frame_index)
    }

    #[inline]
    pub fn position(&self) -> Vertex {
        Vertex::new(self.x, self.y)
    }

    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        self.position().distance(&other.position())
    }
}
