use crate::{Clock, Millis};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// A clock that only moves when told to.
/// Clones share the same time, so a test can keep one handle and give another to the host.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to `now`. Earlier times are ignored; the clock never runs backwards.
    pub fn set(&self, now: Millis) {
        self.now.set(now.max(self.now.get()));
    }

    pub fn advance(&self, delta: Millis) {
        self.now.set(self.now.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.get()
    }
}

/// Wall clock measured from construction, optionally sped up or slowed down.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
    speed: f64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::with_speed(1.0)
    }

    /// `speed` of 2.0 makes simulated time run twice as fast as real time.
    /// Non-positive or non-finite values fall back to 1.0.
    pub fn with_speed(speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        };
        Self {
            origin: Instant::now(),
            speed,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Real-time duration that corresponds to `simulated` ms on this clock.
    pub fn real_duration(&self, simulated: Millis) -> std::time::Duration {
        std::time::Duration::from_secs_f64(simulated as f64 / 1000.0 / self.speed)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        (self.origin.elapsed().as_secs_f64() * 1000.0 * self.speed) as Millis
    }
}
