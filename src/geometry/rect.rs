use serde::{Deserialize, Serialize};

use crate::geometry::Vertex;

/// Bounding box of a target in frame pixel coordinates.
///
/// Stored as TLWH (top-left x, top-left y, width, height). Conversions:
/// - TLBR: Top-Left X, Top-Left Y, Bottom-Right X, Bottom-Right Y
/// - center form: Center X, Center Y, Width, Height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f64,
    /// Top-left y coordinate
    pub y: f64,
    /// Width of the bounding box
    pub width: f64,
    /// Height of the bounding box
    pub height: f64,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect centered on (cx, cy).
    #[inline]
    pub fn from_center(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f64; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Centroid of the box; this is the point recorded on a target's path.
    #[inline]
    pub fn center(&self) -> Vertex {
        Vertex::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// True when a side is non-positive, a coordinate is not finite, or the area is below `min_area`.
    pub fn is_degenerate(&self, min_area: f64) -> bool {
        let finite = self.to_tlwh().iter().all(|v| v.is_finite());
        !finite || self.width <= 0.0 || self.height <= 0.0 || self.area() < min_area
    }

    /// Whether the whole box lies inside a `width` x `height` frame.
    pub fn lies_within(&self, width: u32, height: u32) -> bool {
        let [x1, y1, x2, y2] = self.to_tlbr();
        x1 >= 0.0 && y1 >= 0.0 && x2 <= width as f64 && y2 <= height as f64
    }

    /// Whether the box centroid lies inside a `width` x `height` frame.
    pub fn center_within(&self, width: u32, height: u32) -> bool {
        let c = self.center();
        c.x >= 0.0 && c.y >= 0.0 && c.x <= width as f64 && c.y <= height as f64
    }
}
