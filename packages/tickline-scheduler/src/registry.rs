use crate::{Millis, TimerHandle};
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    pub struct ActionKey;
}

/// One fire-once delayed action.
///
/// `armed_at` and `handle` are always set together: the entry is either
/// counting down on the host or suspended with `remaining_delay` left.
#[derive(Debug, Clone)]
pub struct ScheduledAction<A> {
    pub action: A,
    pub original_delay: Millis,
    pub remaining_delay: Millis,
    pub armed_at: Option<Millis>,
    pub handle: Option<TimerHandle>,
    /// Registration order, used to keep ties stable across pause/resume.
    pub seq: u64,
}

impl<A> ScheduledAction<A> {
    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// Host time at which a live entry comes due.
    pub fn deadline(&self) -> Option<Millis> {
        self.armed_at.map(|at| at.saturating_add(self.remaining_delay))
    }
}

/// Owned collection of scheduled actions.
///
/// Keys are generational, so a key kept after `remove` resolves to nothing
/// instead of aliasing a newer entry.
pub struct TimerRegistry<A> {
    entries: SlotMap<ActionKey, ScheduledAction<A>>,
    by_handle: FxHashMap<TimerHandle, ActionKey>,
    next_seq: u64,
}

impl<A> TimerRegistry<A> {
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            by_handle: FxHashMap::default(),
            next_seq: 0,
        }
    }

    /// Register a suspended entry with its full delay remaining.
    pub fn add(&mut self, action: A, delay: Millis) -> ActionKey {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(ScheduledAction {
            action,
            original_delay: delay,
            remaining_delay: delay,
            armed_at: None,
            handle: None,
            seq,
        })
    }

    /// Attach a freshly armed host timer to `key`.
    /// Returns the previous handle if the entry was already live.
    pub fn attach(&mut self, key: ActionKey, handle: TimerHandle, now: Millis) -> Option<TimerHandle> {
        let entry = self.entries.get_mut(key)?;
        let previous = entry.handle.replace(handle);
        entry.armed_at = Some(now);
        if let Some(previous) = previous {
            self.by_handle.remove(&previous);
        }
        self.by_handle.insert(handle, key);
        previous
    }

    /// Detach the live timer from `key`, charging the time it ran against
    /// `remaining_delay`. Returns the detached handle so the caller can
    /// disarm it; `None` if the entry was not live.
    pub fn cancel(&mut self, key: ActionKey, now: Millis) -> Option<TimerHandle> {
        let entry = self.entries.get_mut(key)?;
        let handle = entry.handle.take()?;
        let armed_at = entry.armed_at.take().unwrap_or(now);
        let elapsed = now.saturating_sub(armed_at);
        entry.remaining_delay = entry.remaining_delay.saturating_sub(elapsed);
        self.by_handle.remove(&handle);
        Some(handle)
    }

    pub fn remove(&mut self, key: ActionKey) -> Option<ScheduledAction<A>> {
        let entry = self.entries.remove(key)?;
        if let Some(handle) = entry.handle {
            self.by_handle.remove(&handle);
        }
        Some(entry)
    }

    pub fn get(&self, key: ActionKey) -> Option<&ScheduledAction<A>> {
        self.entries.get(key)
    }

    pub fn key_for(&self, handle: TimerHandle) -> Option<ActionKey> {
        self.by_handle.get(&handle).copied()
    }

    /// Visit every entry. No particular order.
    pub fn for_each(&self, mut visitor: impl FnMut(ActionKey, &ScheduledAction<A>)) {
        for (key, entry) in &self.entries {
            visitor(key, entry);
        }
    }

    pub fn keys_in_registration_order(&self) -> Vec<ActionKey> {
        let mut keys: Vec<_> = self.entries.iter().map(|(k, e)| (e.seq, k)).collect();
        keys.sort_unstable_by_key(|&(seq, _)| seq);
        keys.into_iter().map(|(_, k)| k).collect()
    }

    /// Empty the registry, returning every handle that was still live.
    pub fn clear(&mut self) -> Vec<TimerHandle> {
        let live = self.by_handle.drain().map(|(handle, _)| handle).collect();
        self.entries.clear();
        live
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.by_handle.len()
    }
}

impl<A> Default for TimerRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}
