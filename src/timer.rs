//! Performance measurement tools.

use std::{
    fmt, mem,
    sync::Mutex,
    time::Instant,
};

use crate::filter::{DeadbandEma, Filter};

const EMA_ALPHA: f32 = 0.3;

/// A timer that measures and averages the time an operation takes.
///
/// Collected timings are averaged and reset when the timer is displayed
/// using `{}` ([`std::fmt::Display`]).
pub struct Timer {
    name: &'static str,
    state: Mutex<State>,
}

struct State {
    ema: DeadbandEma,
    count: usize,
}

impl Timer {
    /// Creates a new timer.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(State {
                ema: DeadbandEma::new(EMA_ALPHA, 0.0),
                count: 0,
            }),
        }
    }

    /// Invokes a closure, measuring and recording the time it takes.
    pub fn time<T>(&self, timee: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = timee();
        let secs = start.elapsed().as_secs_f32();

        let mut state = self.state.lock().unwrap();
        state.ema.push(secs);
        state.count += 1;
        result
    }
}

/// Displays the average recorded time and resets it.
impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut state = self.state.lock().unwrap();
        let avg_ms = state.ema.value().unwrap_or(0.0) * 1000.0;
        let count = mem::replace(&mut state.count, 0);
        state.ema.reset();

        write!(f, "{}: {count}x{avg_ms:.01}ms", self.name)
    }
}

/// Counts frames per second and logs the rate once per second.
pub struct FpsCounter {
    name: &'static str,
    frames: u32,
    window_start: Instant,
}

impl FpsCounter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            frames: 0,
            window_start: Instant::now(),
        }
    }

    /// Records one frame.
    pub fn tick(&mut self) {
        self.frames += 1;
        let elapsed = self.window_start.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            log::debug!("{}: {:.1} FPS", self.name, self.frames as f32 / elapsed);
            self.frames = 0;
            self.window_start = Instant::now();
        }
    }
}
