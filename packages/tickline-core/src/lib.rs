pub mod item;
pub mod program;
pub mod queues;
pub mod runtime;
pub mod snapshot;

pub use item::{Kind, QueueItem};
pub use program::{Action, Program, Step};
pub use queues::{ExecutionQueues, LogEntry};
pub use runtime::{ControlError, RunState, Simulator};
pub use snapshot::{Snapshot, SnapshotSink};
pub use tickline_scheduler::{ManualClock, Millis, SystemClock, TimerHost, TimerQueue};
