//! Simple polygons and the point-in-polygon test behind section lookup.

use geo::{Area, BooleanOps};
use serde::{Deserialize, Serialize};

/// Tolerance for treating a point as lying on a polygon edge.
const EDGE_EPSILON: f64 = 1e-9;

/// Intersections smaller than this (square pixels) count as touching, not overlapping.
const OVERLAP_AREA_EPSILON: f64 = 1e-6;

/// A 2D point in frame pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(&self, other: &Vertex) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<(f64, f64)> for Vertex {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Vertex {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// Closed simple polygon with at least three vertices.
///
/// The closing edge from the last vertex back to the first is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vertex>,
    min: Vertex,
    max: Vertex,
}

impl Polygon {
    /// Returns `None` for fewer than three vertices or any non-finite coordinate.
    pub fn new(vertices: Vec<Vertex>) -> Option<Self> {
        if vertices.len() < 3 || vertices.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return None;
        }

        let mut min = vertices[0];
        let mut max = vertices[0];
        for v in &vertices[1..] {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }

        Some(Self { vertices, min, max })
    }

    /// Axis-aligned rectangle polygon with corners (x1, y1) and (x2, y2).
    pub fn rectangle(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            vertices: vec![
                Vertex::new(x1, y1),
                Vertex::new(x2, y1),
                Vertex::new(x2, y2),
                Vertex::new(x1, y2),
            ],
            min: Vertex::new(x1.min(x2), y1.min(y2)),
            max: Vertex::new(x1.max(x2), y1.max(y2)),
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    fn edges(&self) -> impl Iterator<Item = (Vertex, Vertex)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Boundary-inclusive point-in-polygon test.
    ///
    /// Points on an edge or vertex are inside; everything else is decided by
    /// even-odd ray casting along +x.
    pub fn contains(&self, p: Vertex) -> bool {
        if p.x < self.min.x - EDGE_EPSILON
            || p.x > self.max.x + EDGE_EPSILON
            || p.y < self.min.y - EDGE_EPSILON
            || p.y > self.max.y + EDGE_EPSILON
        {
            return false;
        }

        if self.edges().any(|(a, b)| on_segment(p, a, b)) {
            return true;
        }

        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Unsigned area (shoelace formula).
    pub fn area(&self) -> f64 {
        let twice: f64 = self.edges().map(|(a, b)| a.x * b.y - b.x * a.y).sum();
        twice.abs() / 2.0
    }

    /// Whether the interiors of the two polygons intersect.
    ///
    /// Polygons sharing only an edge or a vertex do not overlap.
    pub fn overlaps(&self, other: &Polygon) -> bool {
        if self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y
        {
            return false;
        }
        self.to_geo().intersection(&other.to_geo()).unsigned_area() > OVERLAP_AREA_EPSILON
    }

    fn to_geo(&self) -> geo::Polygon<f64> {
        let ring: Vec<(f64, f64)> = self.vertices.iter().map(|v| (v.x, v.y)).collect();
        geo::Polygon::new(geo::LineString::from(ring), vec![])
    }
}

fn on_segment(p: Vertex, a: Vertex, b: Vertex) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    let scale = a.distance(&b).max(1.0);
    if cross.abs() > EDGE_EPSILON * scale {
        return false;
    }
    p.x >= a.x.min(b.x) - EDGE_EPSILON
        && p.x <= a.x.max(b.x) + EDGE_EPSILON
        && p.y >= a.y.min(b.y) - EDGE_EPSILON
        && p.y <= a.y.max(b.y) + EDGE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::rectangle(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn test_rejects_short_polygons() {
        assert!(Polygon::new(vec![Vertex::new(0.0, 0.0), Vertex::new(1.0, 1.0)]).is_none());
        assert!(
            Polygon::new(vec![
                Vertex::new(0.0, 0.0),
                Vertex::new(1.0, f64::INFINITY),
                Vertex::new(1.0, 0.0),
            ])
            .is_none()
        );
    }

    #[test]
    fn test_contains_interior_and_exterior() {
        let sq = square();
        assert!(sq.contains(Vertex::new(5.0, 5.0)));
        assert!(sq.contains(Vertex::new(0.1, 9.9)));
        assert!(!sq.contains(Vertex::new(10.1, 5.0)));
        assert!(!sq.contains(Vertex::new(-3.0, -3.0)));
    }

    #[test]
    fn test_boundary_is_inside_and_stable() {
        let sq = square();
        for _ in 0..100 {
            assert!(sq.contains(Vertex::new(10.0, 5.0)));
            assert!(sq.contains(Vertex::new(0.0, 0.0)));
            assert!(sq.contains(Vertex::new(5.0, 10.0)));
        }
    }

    #[test]
    fn test_concave_polygon() {
        // U shape opening upwards
        let u = Polygon::new(vec![
            Vertex::new(0.0, 0.0),
            Vertex::new(9.0, 0.0),
            Vertex::new(9.0, 9.0),
            Vertex::new(6.0, 9.0),
            Vertex::new(6.0, 3.0),
            Vertex::new(3.0, 3.0),
            Vertex::new(3.0, 9.0),
            Vertex::new(0.0, 9.0),
        ])
        .unwrap();
        assert!(u.contains(Vertex::new(1.5, 6.0)));
        assert!(!u.contains(Vertex::new(4.5, 6.0)));
        assert!(u.contains(Vertex::new(4.5, 3.0)));
    }

    #[test]
    fn test_area() {
        assert!((square().area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlap() {
        let sq = square();
        let shifted = Polygon::rectangle(5.0, 5.0, 15.0, 15.0);
        let neighbour = Polygon::rectangle(10.0, 0.0, 20.0, 10.0);
        let far = Polygon::rectangle(30.0, 30.0, 40.0, 40.0);

        assert!(sq.overlaps(&shifted));
        assert!(sq.overlaps(&square()));
        assert!(!sq.overlaps(&neighbour));
        assert!(!sq.overlaps(&far));
    }
}
