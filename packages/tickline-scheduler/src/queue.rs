use crate::{Clock, Millis, TimerHandle, TimerHost};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Armed {
    deadline: Millis,
    handle: TimerHandle,
}

impl Ord for Armed {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on (deadline, arm order). Handles are allocated in arm order.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

impl PartialOrd for Armed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A one-shot timer queue over any [`Clock`].
///
/// Disarming only forgets the handle; the heap entry is discarded lazily
/// once it reaches the top, or in bulk once stale entries outnumber live ones.
pub struct TimerQueue<C: Clock> {
    clock: C,
    heap: BinaryHeap<Armed>,
    armed: FxHashSet<TimerHandle>,
    next_handle: u64,
}

impl<C: Clock> TimerQueue<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            heap: BinaryHeap::new(),
            armed: FxHashSet::default(),
            next_handle: 0,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    fn discard_disarmed(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.armed.contains(&top.handle) {
                break;
            }
            self.heap.pop();
        }
    }

    fn compact(&mut self) {
        if self.heap.len() <= 2 * self.armed.len() {
            return;
        }
        let armed = &self.armed;
        self.heap.retain(|entry| armed.contains(&entry.handle));
    }
}

impl<C: Clock> TimerHost for TimerQueue<C> {
    fn now(&self) -> Millis {
        self.clock.now()
    }

    fn arm(&mut self, delay: Millis) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let deadline = self.clock.now().saturating_add(delay);
        self.heap.push(Armed { deadline, handle });
        self.armed.insert(handle);
        tracing::trace!(?handle, deadline, "timer armed");
        handle
    }

    fn disarm(&mut self, handle: TimerHandle) -> bool {
        let was_armed = self.armed.remove(&handle);
        if was_armed {
            tracing::trace!(?handle, "timer disarmed");
            self.discard_disarmed();
            self.compact();
        }
        was_armed
    }

    fn next_deadline(&self) -> Option<Millis> {
        // Lazily-dropped entries can sit above live ones, so skip them here too.
        self.heap
            .iter()
            .filter(|entry| self.armed.contains(&entry.handle))
            .map(|entry| entry.deadline)
            .min()
    }

    fn pop_due(&mut self) -> Option<TimerHandle> {
        self.discard_disarmed();
        let now = self.clock.now();
        if !self.heap.peek().is_some_and(|top| top.deadline <= now) {
            return None;
        }
        let top = self.heap.pop()?;
        self.armed.remove(&top.handle);
        Some(top.handle)
    }

    fn armed_count(&self) -> usize {
        self.armed.len()
    }
}
