pub mod clock;
pub mod queue;
pub mod registry;
pub mod scheduler;

/// Simulated time in milliseconds.
pub type Millis = u64;

/// A monotonic time source.
/// Implemented by a wall clock for interactive runs and by a manual clock for tests.
pub trait Clock {
    /// Current time in milliseconds (monotonic).
    fn now(&self) -> Millis;
}

/// Opaque handle to one armed host timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub(crate) u64);

/// The host's fire-after-delay facility.
///
/// The host never runs callbacks itself. Expired timers are pulled with
/// [`TimerHost::pop_due`] by whoever drives the loop, which keeps every
/// mutation on a single thread of control.
pub trait TimerHost {
    /// Current host time.
    fn now(&self) -> Millis;

    /// Start a one-shot timer that expires `delay` ms from now.
    fn arm(&mut self, delay: Millis) -> TimerHandle;

    /// Stop a timer. Returns `false` if it already fired or was disarmed.
    fn disarm(&mut self, handle: TimerHandle) -> bool;

    /// Earliest deadline among armed timers.
    fn next_deadline(&self) -> Option<Millis>;

    /// Remove and return the earliest expired timer.
    /// Timers with equal deadlines come out in the order they were armed.
    fn pop_due(&mut self) -> Option<TimerHandle>;

    /// Number of timers still armed.
    fn armed_count(&self) -> usize;
}

pub use clock::{ManualClock, SystemClock};
pub use queue::TimerQueue;
pub use registry::{ActionKey, ScheduledAction, TimerRegistry};
pub use scheduler::{EventScheduler, Fired, FiredBatch};
