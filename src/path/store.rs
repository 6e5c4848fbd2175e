//! Append-only per-target trails.

use std::collections::BTreeMap;

use crate::config::{PathConfig, SmootherConfig};
use crate::error::{Result, TrackingError};
use crate::path::{Heatmap, KalmanFilter, PathMetrics, Point};
use crate::tracker::TargetId;

#[derive(Debug, Clone, Default)]
pub struct PathStore {
    paths: BTreeMap<TargetId, Vec<Point>>,
}

impl PathStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `point` to the target's trail.
    ///
    /// Both the timestamp and the frame index must be strictly greater than
    /// those of the last recorded point, otherwise the trail is left untouched.
    pub fn append(&mut self, target: TargetId, point: Point) -> Result<()> {
        let path = self.paths.entry(target).or_default();
        if let Some(last) = path.last() {
            if point.timestamp <= last.timestamp || point.frame_index <= last.frame_index {
                return Err(TrackingError::OutOfOrderTimestamp {
                    target: Some(target),
                    last_frame_index: last.frame_index,
                    last_timestamp: last.timestamp,
                    frame_index: point.frame_index,
                    timestamp: point.timestamp,
                });
            }
        }
        path.push(point);
        Ok(())
    }

    pub fn path(&self, target: TargetId) -> Option<&[Point]> {
        self.paths.get(&target).map(Vec::as_slice)
    }

    /// The last `n` points of the trail, oldest first.
    pub fn tail(&self, target: TargetId, n: usize) -> &[Point] {
        match self.paths.get(&target) {
            Some(path) => &path[path.len().saturating_sub(n)..],
            None => &[],
        }
    }

    /// Every trail in target id order.
    pub fn paths(&self) -> impl Iterator<Item = (TargetId, &[Point])> + '_ {
        self.paths.iter().map(|(id, path)| (*id, path.as_slice()))
    }

    pub fn metrics(&self, target: TargetId, config: &PathConfig) -> Option<PathMetrics> {
        self.path(target)
            .map(|points| PathMetrics::compute(points, config))
    }

    /// Grid of point counts across all targets.
    pub fn heatmap(&self, bin_size: f64) -> Heatmap {
        Heatmap::from_points(self.paths.values().flatten(), bin_size)
    }

    /// Kalman-filtered copy of the trail with the same timestamps and frame indices.
    pub fn smoothed(&self, target: TargetId, config: &SmootherConfig) -> Option<Vec<Point>> {
        let points = self.path(target)?;
        let kf = KalmanFilter::new(config);

        let mut smoothed = Vec::with_capacity(points.len());
        let mut state = None;
        let mut last_timestamp = 0.0;
        for p in points {
            let (mean, covariance) = match state.take() {
                None => kf.initiate([p.x, p.y]),
                Some((mean, covariance)) => {
                    let (mean, covariance) = kf.predict(&mean, &covariance, p.timestamp - last_timestamp);
                    kf.update(&mean, &covariance, [p.x, p.y])
                        .unwrap_or((mean, covariance))
                }
            };
            smoothed.push(Point::new(mean[0], mean[1], p.timestamp, p.frame_index));
            last_timestamp = p.timestamp;
            state = Some((mean, covariance));
        }
        Some(smoothed)
    }

    pub fn point_count(&self) -> usize {
        self.paths.values().map(Vec::len).sum()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
