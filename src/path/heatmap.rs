use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::path::Point;

/// Point counts over a uniform grid, indexed `[row, col]` = `[y / bin, x / bin]`.
///
/// The grid grows to cover the furthest point; points with negative or
/// non-finite coordinates are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub bin_size: f64,
    pub counts: Array2<u32>,
}

impl Heatmap {
    /// An empty grid is returned when `bin_size` is not positive.
    pub fn from_points<'a, I>(points: I, bin_size: f64) -> Self
    where
        I: IntoIterator<Item = &'a Point>,
    {
        if !(bin_size > 0.0 && bin_size.is_finite()) {
            return Self {
                bin_size,
                counts: Array2::zeros((0, 0)),
            };
        }

        let cells: Vec<(usize, usize)> = points
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite() && p.x >= 0.0 && p.y >= 0.0)
            .map(|p| ((p.y / bin_size) as usize, (p.x / bin_size) as usize))
            .collect();

        let rows = cells.iter().map(|&(r, _)| r + 1).max().unwrap_or(0);
        let cols = cells.iter().map(|&(_, c)| c + 1).max().unwrap_or(0);
        let mut counts = Array2::zeros((rows, cols));
        for (r, c) in cells {
            counts[[r, c]] += 1;
        }

        Self { bin_size, counts }
    }

    /// Count for the cell containing pixel `(x, y)`.
    pub fn at(&self, x: f64, y: f64) -> u32 {
        if !(x >= 0.0 && y >= 0.0) || self.bin_size <= 0.0 {
            return 0;
        }
        let (r, c) = ((y / self.bin_size) as usize, (x / self.bin_size) as usize);
        self.counts.get([r, c]).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binning() {
        let points = [
            Point::new(5.0, 5.0, 0.0, 0),
            Point::new(15.0, 5.0, 0.1, 1),
            Point::new(12.0, 8.0, 0.2, 2),
            Point::new(25.0, 31.0, 0.3, 3),
        ];
        let map = Heatmap::from_points(&points, 10.0);
        assert_eq!(map.counts.dim(), (4, 3));
        assert_eq!(map.at(1.0, 1.0), 1);
        assert_eq!(map.at(19.0, 0.0), 2);
        assert_eq!(map.counts[[3, 2]], 1);
        assert_eq!(map.total(), 4);
        assert_eq!(map.max(), 2);
    }

    #[test]
    fn test_negative_coordinates_ignored() {
        let points = [Point::new(-1.0, 5.0, 0.0, 0), Point::new(5.0, 5.0, 0.1, 1)];
        let map = Heatmap::from_points(&points, 10.0);
        assert_eq!(map.total(), 1);
        assert_eq!(map.at(-1.0, 5.0), 0);
    }

    #[test]
    fn test_bad_bin_size() {
        let points = [Point::new(5.0, 5.0, 0.0, 0)];
        assert!(Heatmap::from_points(&points, 0.0).is_empty());
    }
}
