use serde::{Deserialize, Serialize};

use crate::config::PathConfig;
use crate::path::Point;

/// Summary statistics for one target's trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PathMetrics {
    pub point_count: usize,
    /// Sum of distances between consecutive points, in pixels
    pub total_distance: f64,
    /// Distance between the first and last point
    pub straight_line_distance: f64,
    /// Seconds between the first and last point
    pub duration: f64,
    /// Pixels per second; zero for a path with no duration
    pub average_speed: f64,
    pub direction_changes: usize,
}

impl PathMetrics {
    pub fn compute(points: &[Point], config: &PathConfig) -> Self {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Self::default();
        };

        let total_distance: f64 = points.windows(2).map(|w| w[0].distance(&w[1])).sum();
        let duration = last.timestamp - first.timestamp;
        let average_speed = if duration > 0.0 {
            total_distance / duration
        } else {
            0.0
        };

        Self {
            point_count: points.len(),
            total_distance,
            straight_line_distance: first.distance(last),
            duration,
            average_speed,
            direction_changes: count_direction_changes(
                points,
                config.min_segment_length,
                config.direction_change_deg,
            ),
        }
    }

    /// Straight-line distance over travelled distance, `None` for a path that never moved.
    pub fn efficiency(&self) -> Option<f64> {
        (self.total_distance > 0.0).then(|| self.straight_line_distance / self.total_distance)
    }
}

/// Turns sharper than `threshold_deg` between segments at least `min_segment` long.
///
/// Points closer than `min_segment` to the previous anchor are skipped so
/// box jitter does not register as turning.
fn count_direction_changes(points: &[Point], min_segment: f64, threshold_deg: f64) -> usize {
    let mut anchors: Vec<&Point> = Vec::with_capacity(points.len());
    for p in points {
        match anchors.last() {
            Some(last) if last.distance(p) < min_segment.max(f64::EPSILON) => {}
            _ => anchors.push(p),
        }
    }

    let segments: Vec<(f64, f64)> = anchors
        .windows(2)
        .map(|w| (w[1].x - w[0].x, w[1].y - w[0].y))
        .collect();

    segments
        .windows(2)
        .filter(|w| {
            let (ax, ay) = w[0];
            let (bx, by) = w[1];
            let turn = (ax * by - ay * bx).atan2(ax * bx + ay * by);
            turn.abs().to_degrees() > threshold_deg
        })
        .count()
}
