use crate::item::QueueItem;
use crate::queues::{ExecutionQueues, LogEntry};
use crate::runtime::RunState;
use serde::{Deserialize, Serialize};
use tickline_scheduler::Millis;

/// Read-only copy of everything a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: RunState,
    pub now_ms: Millis,
    pub stack: Vec<QueueItem>,
    pub pending_ops: Vec<QueueItem>,
    pub microtasks: Vec<QueueItem>,
    pub macrotasks: Vec<QueueItem>,
    pub log: Vec<LogEntry>,
}

impl Snapshot {
    pub(crate) fn capture(state: RunState, now_ms: Millis, queues: &ExecutionQueues) -> Self {
        Self {
            state,
            now_ms,
            stack: queues.stack().to_vec(),
            pending_ops: queues.pending_ops().to_vec(),
            microtasks: queues.microtasks().iter().cloned().collect(),
            macrotasks: queues.macrotasks().iter().cloned().collect(),
            log: queues.entries().to_vec(),
        }
    }
}

/// Receives a fresh snapshot after every completed mutation.
pub trait SnapshotSink {
    fn on_snapshot(&self, snapshot: &Snapshot);
}

impl<F: Fn(&Snapshot)> SnapshotSink for F {
    fn on_snapshot(&self, snapshot: &Snapshot) {
        self(snapshot)
    }
}
