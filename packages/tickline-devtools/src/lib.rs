use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use tickline_core::{Kind, RunState, Snapshot, SnapshotSink};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContainerMetrics {
    pub stack_depth: usize,
    pub pending_ops: usize,
    pub microtasks: usize,
    pub macrotasks: usize,
    /// Deepest the stack has been since the last reset.
    pub max_stack_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectorState {
    pub latest: Option<Snapshot>,
    pub snapshots_seen: u64,
    pub metrics: ContainerMetrics,
    /// How many items of each kind have appeared in any container this run.
    pub kinds_seen: Vec<(Kind, u64)>,
}

impl Default for InspectorState {
    fn default() -> Self {
        Self {
            latest: None,
            snapshots_seen: 0,
            metrics: ContainerMetrics::default(),
            kinds_seen: Kind::ALL.iter().map(|&kind| (kind, 0)).collect(),
        }
    }
}

/// Forwards every inspector update somewhere else, e.g. a file or socket.
pub trait InspectorBridge {
    fn send_state(&self, state: &InspectorState);
}

/// Snapshot subscriber that keeps the latest state and running counters.
///
/// Shared with the simulator through an `Rc`; all updates go through a `RefCell`.
#[derive(Default)]
pub struct Inspector {
    state: RefCell<InspectorState>,
    last_max_id: RefCell<Option<u64>>,
    bridge: RefCell<Option<Box<dyn InspectorBridge>>>,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bridge(&self, bridge: Box<dyn InspectorBridge>) {
        *self.bridge.borrow_mut() = Some(bridge);
    }

    pub fn record(&self, snapshot: &Snapshot) {
        let mut state = self.state.borrow_mut();
        state.snapshots_seen += 1;

        if snapshot.state == RunState::Idle {
            state.metrics = ContainerMetrics::default();
            state.kinds_seen = InspectorState::default().kinds_seen;
            *self.last_max_id.borrow_mut() = None;
        }

        // Ids are handed out in order, so anything above the last seen id is new.
        let seen_up_to = *self.last_max_id.borrow();
        let mut max_id = seen_up_to;
        let containers = [
            snapshot.stack.as_slice(),
            snapshot.pending_ops.as_slice(),
            snapshot.microtasks.as_slice(),
            snapshot.macrotasks.as_slice(),
        ];
        for item in containers.into_iter().flatten() {
            if seen_up_to.is_some_and(|seen| item.id <= seen) {
                continue;
            }
            if let Some((_, count)) = state.kinds_seen.iter_mut().find(|(k, _)| *k == item.kind) {
                *count += 1;
            }
            max_id = max_id.max(Some(item.id));
        }
        *self.last_max_id.borrow_mut() = max_id;

        let metrics = &mut state.metrics;
        metrics.stack_depth = snapshot.stack.len();
        metrics.pending_ops = snapshot.pending_ops.len();
        metrics.microtasks = snapshot.microtasks.len();
        metrics.macrotasks = snapshot.macrotasks.len();
        metrics.max_stack_depth = metrics.max_stack_depth.max(snapshot.stack.len());

        state.latest = Some(snapshot.clone());

        if let Some(bridge) = self.bridge.borrow().as_ref() {
            bridge.send_state(&state);
        }
    }

    pub fn state(&self) -> InspectorState {
        self.state.borrow().clone()
    }

    pub fn export_state(&self) -> String {
        serde_json::to_string(&*self.state.borrow()).unwrap_or_default()
    }
}

impl SnapshotSink for Inspector {
    fn on_snapshot(&self, snapshot: &Snapshot) {
        self.record(snapshot);
    }
}
