use crate::registry::{ActionKey, TimerRegistry};
use crate::{Millis, TimerHost};
use smallvec::SmallVec;

/// Actions fired by a single [`EventScheduler::fire_due`] call.
pub type FiredBatch<A> = SmallVec<[A; 4]>;

/// A fired action with the host time it came due, which may be earlier than
/// the time it was pulled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<A> {
    pub deadline: Millis,
    pub action: A,
}

/// Owns the timer registry and is the only thing that arms or disarms host timers.
///
/// Actions are plain data. Firing hands them back to the caller in order
/// instead of running closures, so the caller's dispatcher decides what an
/// action means.
pub struct EventScheduler<H: TimerHost, A> {
    host: H,
    registry: TimerRegistry<A>,
}

impl<H: TimerHost, A> EventScheduler<H, A> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            registry: TimerRegistry::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn registry(&self) -> &TimerRegistry<A> {
        &self.registry
    }

    pub fn now(&self) -> Millis {
        self.host.now()
    }

    /// Register `action` to fire `delay` ms from now.
    pub fn schedule(&mut self, action: A, delay: Millis) -> ActionKey {
        let key = self.registry.add(action, delay);
        let handle = self.host.arm(delay);
        self.registry.attach(key, handle, self.host.now());
        tracing::debug!(?key, delay, "action scheduled");
        key
    }

    /// Pop every expired timer and return the matching actions in fire order.
    ///
    /// Each fired entry is removed from the registry. A handle that no
    /// longer maps to a registered entry was cancelled while in flight and
    /// is dropped.
    pub fn fire_due(&mut self) -> FiredBatch<A> {
        self.fire_due_with_deadlines()
            .into_iter()
            .map(|fired| fired.action)
            .collect()
    }

    /// Like [`fire_due`](Self::fire_due), keeping each action's deadline.
    pub fn fire_due_with_deadlines(&mut self) -> SmallVec<[Fired<A>; 4]> {
        let mut fired = SmallVec::new();
        while let Some(handle) = self.host.pop_due() {
            let Some(key) = self.registry.key_for(handle) else {
                tracing::warn!(?handle, "stale timer fired after cancellation, ignoring");
                continue;
            };
            let now = self.host.now();
            if let Some(entry) = self.registry.remove(key) {
                let deadline = entry.deadline().unwrap_or(now);
                tracing::debug!(?key, delay = entry.original_delay, deadline, "action fired");
                fired.push(Fired {
                    deadline,
                    action: entry.action,
                });
            }
        }
        fired
    }

    /// Suspend every live timer, keeping what is left of its delay.
    /// Entries that are already suspended are left alone.
    pub fn pause_all(&mut self) {
        let now = self.host.now();
        let mut paused = 0usize;
        for key in self.registry.keys_in_registration_order() {
            if let Some(handle) = self.registry.cancel(key, now) {
                self.host.disarm(handle);
                paused += 1;
            }
        }
        tracing::debug!(paused, now, "timers paused");
    }

    /// Re-arm every suspended entry for its remaining delay.
    /// Entries are re-armed in registration order so equal remainders keep their tie-break.
    pub fn resume_all(&mut self) {
        let now = self.host.now();
        let mut resumed = 0usize;
        for key in self.registry.keys_in_registration_order() {
            let Some(entry) = self.registry.get(key) else {
                continue;
            };
            if entry.is_live() {
                continue;
            }
            let handle = self.host.arm(entry.remaining_delay);
            self.registry.attach(key, handle, now);
            resumed += 1;
        }
        tracing::debug!(resumed, now, "timers resumed");
    }

    /// Disarm every live timer and forget every entry.
    ///
    /// With a pull-based host nothing cancelled here can fire afterwards: a
    /// handle that still comes out of the host fails the registry lookup in
    /// [`fire_due`](Self::fire_due).
    pub fn cancel_all(&mut self) {
        let live = self.registry.clear();
        let cancelled = live.len();
        for handle in live {
            self.host.disarm(handle);
        }
        tracing::debug!(cancelled, "timers cancelled");
    }

    /// Deadline of the next live timer, if any.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.host.next_deadline()
    }

    /// Entries still waiting to fire, live or suspended.
    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    pub fn live_timer_count(&self) -> usize {
        self.registry.live_count()
    }

    /// True when entries are waiting and none of them is counting down.
    pub fn is_paused(&self) -> bool {
        !self.registry.is_empty() && self.registry.live_count() == 0
    }
}
