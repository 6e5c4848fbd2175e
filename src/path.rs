mod heatmap;
mod kalman_filter;
mod metrics;
mod point;
mod store;

pub use heatmap::Heatmap;
pub use kalman_filter::KalmanFilter;
pub use metrics::PathMetrics;
pub use point::Point;
pub use store::PathStore;
