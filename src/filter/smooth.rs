//! Exponential smoothing with a dead band.

use super::Filter;

/// Exponential Moving Average that ignores changes below a threshold.
///
/// Small frame-to-frame jitter (sub-threshold) leaves the smoothed value
/// untouched, which keeps displayed measurements rock-steady; larger changes
/// blend in at the configured rate. The first pushed value initializes the
/// average directly, without blending.
#[derive(Debug, Clone)]
pub struct DeadbandEma {
    alpha: f32,
    threshold: f32,
    smoothed: Option<f32>,
}

impl DeadbandEma {
    /// Creates a new dead-band EMA.
    ///
    /// `alpha` must be between 0.0 and 1.0 and defines how quickly the
    /// average tracks changes that exceed the dead band. `threshold` is the
    /// dead-band half-width, in the unit of the filtered value.
    pub fn new(alpha: f32, threshold: f32) -> Self {
        assert!((0.0..=1.0).contains(&alpha));
        assert!(threshold >= 0.0);
        Self {
            alpha,
            threshold,
            smoothed: None,
        }
    }

    /// Returns the current smoothed value without pushing a new sample.
    #[inline]
    pub fn value(&self) -> Option<f32> {
        self.smoothed
    }
}

impl Filter<f32> for DeadbandEma {
    fn push(&mut self, value: f32) -> f32 {
        match self.smoothed {
            Some(smoothed) if (value - smoothed).abs() < self.threshold => smoothed,
            Some(smoothed) => {
                let next = smoothed + (value - smoothed) * self.alpha;
                self.smoothed = Some(next);
                next
            }
            None => {
                self.smoothed = Some(value);
                value
            }
        }
    }

    fn reset(&mut self) {
        self.smoothed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn dead_band_suppresses_jitter() {
        let mut ema = DeadbandEma::new(0.3, 1.0);
        assert_relative_eq!(ema.push(100.0), 100.0);
        // 100.5 is within the dead band of 100 and changes nothing.
        assert_relative_eq!(ema.push(100.5), 100.0);
        // 102 exceeds it and blends: 100 + (102 - 100) * 0.3.
        assert_relative_eq!(ema.push(102.0), 100.6, epsilon = 1e-5);
    }

    #[test]
    fn reset_forgets_history() {
        let mut ema = DeadbandEma::new(0.5, 0.0);
        ema.push(10.0);
        ema.reset();
        assert_eq!(ema.value(), None);
        assert_relative_eq!(ema.push(42.0), 42.0);
    }
}
