//! Capability traits for the single-target visual tracker.

use crate::error::BackendError;
use crate::geometry::Rect;
use crate::tracker::TargetId;

/// One decoded frame handed over by the frame source.
///
/// The pixel layout is whatever the backend in use expects; the core only
/// reads the index, timestamp and dimensions.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub index: u64,
    /// Seconds since the start of the video
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn new(index: u64, timestamp: f64, width: u32, height: u32, pixels: &'a [u8]) -> Self {
        Self {
            index,
            timestamp,
            width,
            height,
            pixels,
        }
    }
}

impl Frame<'static> {
    /// Frame with no pixel payload, for backends that do not read pixels.
    pub fn blank(index: u64, timestamp: f64, width: u32, height: u32) -> Self {
        Self::new(index, timestamp, width, height, &[])
    }
}

/// Trait for single-target visual trackers (CSRT, KCF, MOSSE, ...).
///
/// Implement this trait to plug any tracking algorithm into the session.
///
/// # Example
///
/// ```ignore
/// use visittrack_rs::{Frame, Rect, TrackingBackend, BackendError};
///
/// struct Csrt { /* native handle */ }
///
/// impl TrackingBackend for Csrt {
///     fn init(&mut self, frame: &Frame<'_>, bbox: Rect) -> Result<(), BackendError> {
///         Ok(())
///     }
///
///     fn update(&mut self, frame: &Frame<'_>) -> Option<Rect> {
///         None
///     }
/// }
/// ```
pub trait TrackingBackend: Send {
    /// Seed the tracker with the subject's box on `frame`.
    fn init(&mut self, frame: &Frame<'_>, bbox: Rect) -> Result<(), BackendError>;

    /// Locate the subject on the next frame, or `None` when it was lost.
    fn update(&mut self, frame: &Frame<'_>) -> Option<Rect>;
}

/// Creates a fresh backend per target (and per re-seed).
pub trait BackendFactory: Send + Sync {
    fn create(&self, target: TargetId) -> Result<Box<dyn TrackingBackend>, BackendError>;
}

impl<F> BackendFactory for F
where
    F: Fn(TargetId) -> Box<dyn TrackingBackend> + Send + Sync,
{
    fn create(&self, target: TargetId) -> Result<Box<dyn TrackingBackend>, BackendError> {
        Ok(self(target))
    }
}
