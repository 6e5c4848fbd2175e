//! Constant-velocity Kalman filter for smoothing 2D trails, using ndarray and
//! a nalgebra-based inverse.
//!
//! State is `[x, y, vx, vy]`; only the position is measured. Unlike a
//! fixed-rate box filter, `predict` takes the elapsed time so irregular frame
//! gaps (skipped frames during transient loss) are handled.

use ndarray::{Array1, Array2};

use crate::config::SmootherConfig;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    update_mat: Array2<f64>,
    position_noise: f64,
    velocity_noise: f64,
    measurement_noise: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(&SmootherConfig::default())
    }
}

impl KalmanFilter {
    pub fn new(config: &SmootherConfig) -> Self {
        let mut update_mat = Array2::zeros((2, 4));
        for i in 0..2 {
            update_mat[[i, i]] = 1.0;
        }

        Self {
            update_mat,
            position_noise: config.position_noise,
            velocity_noise: config.velocity_noise,
            measurement_noise: config.measurement_noise,
        }
    }

    /// Start a track at rest on the first measurement.
    pub fn initiate(&self, measurement: [f64; 2]) -> (Array1<f64>, Array2<f64>) {
        let mean = Array1::from_vec(vec![measurement[0], measurement[1], 0.0, 0.0]);

        let std = [
            self.measurement_noise,
            self.measurement_noise,
            10.0 * self.velocity_noise,
            10.0 * self.velocity_noise,
        ];
        let mut cov = Array2::zeros((4, 4));
        for i in 0..4 {
            cov[[i, i]] = std[i] * std[i];
        }

        (mean, cov)
    }

    /// Advance the state by `dt` seconds.
    pub fn predict(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        dt: f64,
    ) -> (Array1<f64>, Array2<f64>) {
        let mut motion_mat = Array2::<f64>::eye(4);
        motion_mat[[0, 2]] = dt;
        motion_mat[[1, 3]] = dt;

        let std = [
            self.position_noise,
            self.position_noise,
            self.velocity_noise,
            self.velocity_noise,
        ];
        let mut motion_cov = Array2::<f64>::zeros((4, 4));
        for i in 0..4 {
            motion_cov[[i, i]] = std[i] * std[i] * dt;
        }

        let new_mean = motion_mat.dot(mean);
        let new_covariance = motion_mat.dot(covariance).dot(&motion_mat.t()) + motion_cov;

        (new_mean, new_covariance)
    }

    pub fn project(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let r = self.measurement_noise * self.measurement_noise;
        let innovation_cov = Array2::<f64>::eye(2) * r;

        let mean_proj = self.update_mat.dot(mean);
        let covariance_proj =
            self.update_mat.dot(covariance).dot(&self.update_mat.t()) + innovation_cov;

        (mean_proj, covariance_proj)
    }

    /// Correct the state with a position measurement.
    ///
    /// Returns `None` when the innovation covariance is singular; callers keep
    /// the predicted state for that step.
    pub fn update(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        measurement: [f64; 2],
    ) -> Option<(Array1<f64>, Array2<f64>)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);

        let measurement_arr = Array1::from_vec(measurement.to_vec());
        let innovation = measurement_arr - projected_mean;

        // K = P * H^T * S^-1, with H = [I 0] so P * H^T is the first two columns of P.
        let s_inv = invert_2x2(&projected_cov)?;

        let pht = covariance.dot(&self.update_mat.t()); // 4x2
        let kalman_gain = pht.dot(&s_inv); // 4x2

        let new_mean = mean + &kalman_gain.dot(&innovation);
        let new_covariance = covariance - &kalman_gain.dot(&projected_cov).dot(&kalman_gain.t());

        Some((new_mean, new_covariance))
    }
}

fn invert_2x2(m: &Array2<f64>) -> Option<Array2<f64>> {
    let nm = nalgebra::Matrix2::new(m[[0, 0]], m[[0, 1]], m[[1, 0]], m[[1, 1]]);
    let inv = nm.try_inverse()?;
    let mut res = Array2::zeros((2, 2));
    for i in 0..2 {
        for j in 0..2 {
            res[[i, j]] = inv[(i, j)];
        }
    }
    Some(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initiate() {
        let kf = KalmanFilter::default();
        let (mean, cov) = kf.initiate([100.0, 200.0]);
        assert_eq!(mean[0], 100.0);
        assert_eq!(mean[1], 200.0);
        assert_eq!(mean[2], 0.0);
        assert!(cov[[2, 2]] > cov[[0, 0]]);
    }

    #[test]
    fn test_predict_moves_with_velocity() {
        let kf = KalmanFilter::default();
        let (mut mean, cov) = kf.initiate([0.0, 0.0]);
        mean[2] = 10.0;
        let (predicted, _) = kf.predict(&mean, &cov, 0.5);
        assert!((predicted[0] - 5.0).abs() < 1e-12);
        assert_eq!(predicted[1], 0.0);
    }

    #[test]
    fn test_update_pulls_towards_measurement() {
        let kf = KalmanFilter::default();
        let (mean, cov) = kf.initiate([0.0, 0.0]);
        let (predicted, pcov) = kf.predict(&mean, &cov, 1.0);
        let (updated, _) = kf.update(&predicted, &pcov, [10.0, 0.0]).unwrap();
        assert!(updated[0] > 0.0 && updated[0] < 10.0);
    }

    #[test]
    fn test_singular_innovation_skips_update() {
        let kf = KalmanFilter::new(&SmootherConfig {
            position_noise: 0.0,
            velocity_noise: 0.0,
            measurement_noise: 0.0,
        });
        let mean = Array1::zeros(4);
        let cov = Array2::zeros((4, 4));
        assert!(kf.update(&mean, &cov, [1.0, 1.0]).is_none());
    }
}
