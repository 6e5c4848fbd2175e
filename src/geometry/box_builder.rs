//! Builder for creating boxes from the formats trackers and UIs hand us.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Layout of a raw `[f64; 4]` box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxFormat {
    /// top-left x, top-left y, width, height
    #[default]
    Tlwh,
    /// top-left x, top-left y, bottom-right x, bottom-right y
    Tlbr,
    /// center x, center y, width, height
    Center,
}

/// Builder for creating a `Rect` from various input formats.
#[derive(Debug, Clone, Default)]
pub struct BoxBuilder {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl BoxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box by center and size (cx, cy, width, height).
    pub fn center(mut self, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, x: f64, y: f64, w: f64, h: f64) -> Self {
        self.x1 = x;
        self.y1 = y;
        self.x2 = x + w;
        self.y2 = y + h;
        self
    }

    /// Set the box from a raw array laid out as `format`.
    pub fn raw(self, format: BoxFormat, [a, b, c, d]: [f64; 4]) -> Self {
        match format {
            BoxFormat::Tlwh => self.tlwh(a, b, c, d),
            BoxFormat::Tlbr => self.tlbr(a, b, c, d),
            BoxFormat::Center => self.center(a, b, c, d),
        }
    }

    pub fn build(self) -> Rect {
        Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_builder_formats() {
        let expected = Rect::new(10.0, 20.0, 40.0, 60.0);

        assert_eq!(BoxBuilder::new().tlbr(10.0, 20.0, 50.0, 80.0).build(), expected);
        assert_eq!(BoxBuilder::new().tlwh(10.0, 20.0, 40.0, 60.0).build(), expected);
        assert_eq!(BoxBuilder::new().center(30.0, 50.0, 40.0, 60.0).build(), expected);
        assert_eq!(
            BoxBuilder::new()
                .raw(BoxFormat::Tlbr, [10.0, 20.0, 50.0, 80.0])
                .build(),
            expected
        );
    }
}
