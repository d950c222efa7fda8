use crate::item::{Kind, QueueItem};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tickline_scheduler::Millis;

/// One line of the output log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Milliseconds since the run started.
    pub at_ms: Millis,
    pub message: String,
}

/// The four containers of the execution pipeline plus the output log.
///
/// Every mutation touches one container and appends a log line. Items only
/// leave a container by being removed here; callers get owned copies.
#[derive(Debug, Default)]
pub struct ExecutionQueues {
    stack: Vec<QueueItem>,
    pending_ops: Vec<QueueItem>,
    microtasks: VecDeque<QueueItem>,
    macrotasks: VecDeque<QueueItem>,
    log: Vec<LogEntry>,
    next_id: u64,
    now: Millis,
}

impl ExecutionQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp used for the log lines that follow.
    pub fn set_now(&mut self, now: Millis) {
        self.now = now;
    }

    fn item(&mut self, text: &str, kind: Kind, duration_ms: u64) -> QueueItem {
        let id = self.next_id;
        self.next_id += 1;
        QueueItem {
            id,
            text: text.to_owned(),
            kind,
            duration_ms,
        }
    }

    pub fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(at_ms = self.now, "{message}");
        self.log.push(LogEntry {
            at_ms: self.now,
            message,
        });
    }

    pub fn push_stack(&mut self, text: &str, kind: Kind, duration_ms: u64) -> u64 {
        let item = self.item(text, kind, duration_ms);
        let id = item.id;
        self.stack.push(item);
        self.log(format!("{text} pushed to call stack"));
        id
    }

    /// Remove the first stack frame labelled `text`. Absent labels are a no-op.
    pub fn pop_stack_by_text(&mut self, text: &str) -> Option<QueueItem> {
        let index = self.stack.iter().position(|item| item.text == text)?;
        let item = self.stack.remove(index);
        self.log(format!("{} popped from call stack", item.text));
        Some(item)
    }

    pub fn pop_stack_by_id(&mut self, id: u64) -> Option<QueueItem> {
        let index = self.stack.iter().position(|item| item.id == id)?;
        let item = self.stack.remove(index);
        self.log(format!("{} popped from call stack", item.text));
        Some(item)
    }

    pub fn add_pending_op(&mut self, text: &str, kind: Kind, duration_ms: u64) -> u64 {
        let item = self.item(text, kind, duration_ms);
        let id = item.id;
        self.pending_ops.push(item);
        self.log(format!("{text} started ({duration_ms}ms)"));
        id
    }

    /// Remove every pending op of `kind`.
    pub fn remove_pending_ops_by_kind(&mut self, kind: Kind) -> Vec<QueueItem> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_ops)
            .into_iter()
            .partition(|item| item.kind == kind);
        self.pending_ops = kept;
        for item in &removed {
            self.log(format!("{} finished", item.text));
        }
        removed
    }

    pub fn enqueue_microtask(&mut self, text: &str, kind: Kind) -> u64 {
        let item = self.item(text, kind, 0);
        let id = item.id;
        self.microtasks.push_back(item);
        self.log(format!("{text} queued as microtask"));
        id
    }

    /// Take the whole microtask queue at once, leaving it empty.
    pub fn drain_microtasks(&mut self) -> Vec<QueueItem> {
        let drained: Vec<_> = self.microtasks.drain(..).collect();
        if !drained.is_empty() {
            self.log(format!("Microtask queue drained ({} task(s))", drained.len()));
        }
        drained
    }

    pub fn enqueue_macrotask(&mut self, text: &str, kind: Kind) -> u64 {
        let item = self.item(text, kind, 0);
        let id = item.id;
        self.macrotasks.push_back(item);
        self.log(format!("{text} queued as macrotask"));
        id
    }

    pub fn dequeue_one_macrotask(&mut self) -> Option<QueueItem> {
        let item = self.macrotasks.pop_front()?;
        self.log(format!("{} dequeued from macrotask queue", item.text));
        Some(item)
    }

    /// Empty every container and the log, and restart ids at 0.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn stack(&self) -> &[QueueItem] {
        &self.stack
    }

    pub fn pending_ops(&self) -> &[QueueItem] {
        &self.pending_ops
    }

    pub fn microtasks(&self) -> &VecDeque<QueueItem> {
        &self.microtasks
    }

    pub fn macrotasks(&self) -> &VecDeque<QueueItem> {
        &self.macrotasks
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.log
    }

    /// Id the next created item will get.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// True when all four containers are empty. The log is not considered.
    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
            && self.pending_ops.is_empty()
            && self.microtasks.is_empty()
            && self.macrotasks.is_empty()
    }
}
