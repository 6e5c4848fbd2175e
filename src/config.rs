//! Tunable parameters for a session.
//!
//! Every struct deserializes with `#[serde(default)]`, so a config file only
//! needs to name the values it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::SectionId;

/// Tracker loss policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Consecutive failed frames before a target turns Lost
    pub loss_threshold: u32,
    /// Boxes smaller than this (square pixels) count as a failed frame
    pub min_box_area: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            loss_threshold: 5,
            min_box_area: 1.0,
        }
    }
}

/// Constant-velocity Kalman smoother noise levels, in pixels and pixels/second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    pub position_noise: f64,
    pub velocity_noise: f64,
    pub measurement_noise: f64,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            position_noise: 1.0,
            velocity_noise: 10.0,
            measurement_noise: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Turning angle (degrees) above which a direction change is counted
    pub direction_change_deg: f64,
    /// Shorter movements are merged before measuring turning angles
    pub min_segment_length: f64,
    pub smoother: SmootherConfig,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            direction_change_deg: 30.0,
            min_segment_length: 2.0,
            smoother: SmootherConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitConfig {
    /// Consecutive observations needed to confirm an entry or an exit
    pub debounce_frames: u32,
}

impl Default for VisitConfig {
    fn default() -> Self {
        Self { debounce_frames: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Maximum nesting (store → department → section → shelf)
    pub max_depth: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { max_depth: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub entrance: Option<SectionId>,
    pub checkout: Option<SectionId>,
    /// Heat-map cell size in pixels
    pub heatmap_bin_size: f64,
    /// Minimum number of occurrences for a common section sequence
    pub min_support: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            entrance: None,
            checkout: None,
            heatmap_bin_size: 20.0,
            min_support: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tracking: TrackingConfig,
    pub paths: PathConfig,
    pub visits: VisitConfig,
    pub layout: LayoutConfig,
    pub analytics: AnalyticsConfig,
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = SessionConfig::from_json(
            r#"{"visits": {"debounce_frames": 5}, "analytics": {"entrance": 1, "checkout": 7}}"#,
        )
        .unwrap();
        assert_eq!(cfg.visits.debounce_frames, 5);
        assert_eq!(cfg.tracking.loss_threshold, 5);
        assert_eq!(cfg.analytics.entrance, Some(SectionId(1)));
        assert_eq!(cfg.analytics.heatmap_bin_size, 20.0);
        assert_eq!(cfg.layout.max_depth, 4);
    }

    #[test]
    fn test_load_reads_file() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"{\"tracking\": {\"loss_threshold\": 8}}")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = SessionConfig::load(&path).unwrap();
        assert_eq!(cfg.tracking.loss_threshold, 8);
        assert_eq!(cfg.tracking.min_box_area, 1.0);
    }
}
