//! Scalar Kalman-style filtering.

use super::Filter;

/// A 1-dimensional Kalman filter with constant process and measurement noise.
///
/// Compared to [`DeadbandEma`][super::DeadbandEma], this filter adapts its
/// blend factor to the accumulated error estimate: it trusts measurements
/// more while its own estimate is uncertain and less once it has converged.
#[derive(Debug, Clone)]
pub struct Kalman {
    process_noise: f32,
    measurement_noise: f32,
    estimate: Option<f32>,
    error_cov: f32,
}

impl Kalman {
    /// Creates a new scalar Kalman filter.
    ///
    /// Both noise parameters must be greater than zero.
    pub fn new(process_noise: f32, measurement_noise: f32) -> Self {
        assert!(process_noise > 0.0);
        assert!(measurement_noise > 0.0);
        Self {
            process_noise,
            measurement_noise,
            estimate: None,
            error_cov: 1.0,
        }
    }

    /// Returns the current estimate without pushing a new measurement.
    #[inline]
    pub fn estimate(&self) -> Option<f32> {
        self.estimate
    }
}

impl Filter<f32> for Kalman {
    fn push(&mut self, measurement: f32) -> f32 {
        let estimate = match self.estimate {
            // The first measurement seeds the estimate directly.
            None => measurement,
            Some(estimate) => {
                self.error_cov += self.process_noise;
                let gain = self.error_cov / (self.error_cov + self.measurement_noise);
                self.error_cov *= 1.0 - gain;
                estimate + gain * (measurement - estimate)
            }
        };
        self.estimate = Some(estimate);
        estimate
    }

    fn reset(&mut self) {
        self.estimate = None;
        self.error_cov = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_measurement_seeds_estimate() {
        let mut kf = Kalman::new(0.01, 0.1);
        assert_relative_eq!(kf.push(5.0), 5.0);
    }

    #[test]
    fn update_follows_gain_equations() {
        let mut kf = Kalman::new(0.5, 1.0);
        kf.push(0.0);
        // cov = 1.0 + 0.5; gain = 1.5 / 2.5 = 0.6; estimate = 0 + 0.6 * 10.
        assert_relative_eq!(kf.push(10.0), 6.0, epsilon = 1e-5);
    }

    #[test]
    fn converges_toward_constant_signal() {
        let mut kf = Kalman::new(0.01, 0.5);
        let mut last = kf.push(0.0);
        for _ in 0..50 {
            last = kf.push(10.0);
        }
        assert!((last - 10.0).abs() < 0.1, "estimate was {last}");
    }
}
