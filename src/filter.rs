//! Temporal stabilization for noisy per-frame measurements.

mod kalman;
mod presence;
mod smooth;

pub use kalman::Kalman;
pub use presence::Presence;
pub use smooth::DeadbandEma;

/// A filter for values of type `V`.
pub trait Filter<V> {
    /// Adds a new value to the filter, returning the filtered value.
    fn push(&mut self, value: V) -> V;

    /// Resets the filter state to be identical to the state just after
    /// construction.
    fn reset(&mut self);
}

impl<V> Filter<V> for Box<dyn Filter<V>> {
    fn push(&mut self, value: V) -> V {
        (**self).push(value)
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}
