use crate::item::QueueItem;
use crate::program::{Action, Program};
use crate::queues::ExecutionQueues;
use crate::snapshot::{Snapshot, SnapshotSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use tickline_scheduler::{EventScheduler, Millis, TimerHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Complete,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Complete => "complete",
        })
    }
}

/// A trigger that is not legal in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("a simulation is already {0}")]
    AlreadyActive(RunState),
    #[error("cannot pause while {0}")]
    NotRunning(RunState),
    #[error("cannot resume while {0}")]
    NotPaused(RunState),
}

#[derive(Default, Debug, Clone, Copy)]
pub struct Profiling {
    pub runs: u64,
    pub actions_fired: u64,
    pub snapshots_sent: u64,
}

/// Drives a [`Program`] through the event scheduler and owns the execution queues.
///
/// All state lives behind `&mut self`, so triggers and timer firings are
/// serialized by construction.
pub struct Simulator<H: TimerHost> {
    scheduler: EventScheduler<H, Action>,
    queues: ExecutionQueues,
    program: Program,
    state: RunState,
    /// Host time at which the current run started.
    origin: Millis,
    sinks: Vec<Box<dyn SnapshotSink>>,
    pub profiling: Profiling,
}

impl<H: TimerHost> Simulator<H> {
    pub fn new(host: H, program: Program) -> Self {
        Self {
            scheduler: EventScheduler::new(host),
            queues: ExecutionQueues::new(),
            program,
            state: RunState::Idle,
            origin: 0,
            sinks: Vec::new(),
            profiling: Profiling::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn queues(&self) -> &ExecutionQueues {
        &self.queues
    }

    pub fn scheduler(&self) -> &EventScheduler<H, Action> {
        &self.scheduler
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Milliseconds since the current run started.
    pub fn elapsed(&self) -> Millis {
        self.scheduler.now().saturating_sub(self.origin)
    }

    pub fn subscribe(&mut self, sink: impl SnapshotSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.state, self.elapsed(), &self.queues)
    }

    fn notify(&mut self) {
        if self.sinks.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for sink in &self.sinks {
            sink.on_snapshot(&snapshot);
        }
        self.profiling.snapshots_sent += 1;
    }

    /// Start a fresh run. Steps due at t=0 fire before this returns.
    pub fn try_run(&mut self) -> Result<(), ControlError> {
        if matches!(self.state, RunState::Running | RunState::Paused) {
            return Err(ControlError::AlreadyActive(self.state));
        }
        self.reset();

        self.origin = self.scheduler.now();
        self.state = RunState::Running;
        self.profiling.runs += 1;
        for step in self.program.steps() {
            self.scheduler.schedule(step.action.clone(), step.at_ms);
        }
        tracing::info!(steps = self.program.len(), "simulation started");

        self.notify();
        self.tick();
        Ok(())
    }

    pub fn try_pause(&mut self) -> Result<(), ControlError> {
        if self.state != RunState::Running {
            return Err(ControlError::NotRunning(self.state));
        }
        // Overdue steps fire at their own deadline, not after the pause.
        self.tick();
        if self.state != RunState::Running {
            return Err(ControlError::NotRunning(self.state));
        }
        self.scheduler.pause_all();
        self.state = RunState::Paused;
        self.queues.set_now(self.elapsed());
        self.queues.log("Simulation paused");
        tracing::info!(at_ms = self.elapsed(), "simulation paused");
        self.notify();
        Ok(())
    }

    pub fn try_resume(&mut self) -> Result<(), ControlError> {
        if self.state != RunState::Paused {
            return Err(ControlError::NotPaused(self.state));
        }
        self.scheduler.resume_all();
        self.state = RunState::Running;
        self.queues.set_now(self.elapsed());
        self.queues.log("Simulation resumed");
        tracing::info!(at_ms = self.elapsed(), "simulation resumed");
        self.notify();
        Ok(())
    }

    pub fn run(&mut self) {
        if let Err(err) = self.try_run() {
            tracing::debug!("run ignored: {err}");
        }
    }

    pub fn pause(&mut self) {
        if let Err(err) = self.try_pause() {
            tracing::debug!("pause ignored: {err}");
        }
    }

    pub fn resume(&mut self) {
        if let Err(err) = self.try_resume() {
            tracing::debug!("resume ignored: {err}");
        }
    }

    pub fn pause_or_resume(&mut self) {
        match self.state {
            RunState::Running => self.pause(),
            RunState::Paused => self.resume(),
            state => tracing::debug!("pause/resume ignored while {state}"),
        }
    }

    /// Back to idle from any state: no timers, empty containers and log, ids from 0.
    pub fn reset(&mut self) {
        self.scheduler.cancel_all();
        self.queues.clear();
        self.state = RunState::Idle;
        tracing::info!("simulation reset");
        self.notify();
    }

    /// Fire and dispatch every action that is due, each logged at its own
    /// deadline. Stops early once the run completes. Returns how many were dispatched.
    pub fn tick(&mut self) -> usize {
        if self.state != RunState::Running {
            return 0;
        }
        let mut count = 0;
        for fired in self.scheduler.fire_due_with_deadlines() {
            if self.state != RunState::Running {
                break;
            }
            self.queues.set_now(fired.deadline.saturating_sub(self.origin));
            self.dispatch(fired.action);
            self.profiling.actions_fired += 1;
            count += 1;
            self.notify();
        }
        count
    }

    /// Host time of the next step, if one is counting down.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.scheduler.next_deadline()
    }

    fn dispatch(&mut self, action: Action) {
        tracing::trace!(?action, "dispatching");
        match action {
            Action::PushStack { text, kind } => {
                self.queues.push_stack(&text, kind, 0);
            }
            Action::PopStack { text } => {
                self.queues.pop_stack_by_text(&text);
            }
            Action::StackToPending {
                frame,
                text,
                kind,
                duration_ms,
            } => {
                self.queues.pop_stack_by_text(&frame);
                self.queues.add_pending_op(&text, kind, duration_ms);
            }
            Action::StackToMicrotask { frame, text, kind } => {
                self.queues.pop_stack_by_text(&frame);
                self.queues.enqueue_microtask(&text, kind);
            }
            Action::SettlePending { kind, text } => {
                for _ in self.queues.remove_pending_ops_by_kind(kind) {
                    self.queues.enqueue_macrotask(&text, kind);
                }
            }
            Action::DrainMicrotasks => self.microtask_checkpoint(),
            Action::RunMacrotasks => {
                while let Some(task) = self.queues.dequeue_one_macrotask() {
                    self.execute(task);
                    self.microtask_checkpoint();
                }
            }
            Action::Complete => {
                self.scheduler.cancel_all();
                self.state = RunState::Complete;
                self.queues.log("Simulation complete");
                tracing::info!(at_ms = self.elapsed(), "simulation complete");
            }
        }
    }

    fn microtask_checkpoint(&mut self) {
        for task in self.queues.drain_microtasks() {
            self.execute(task);
        }
    }

    /// Run a dequeued task as a call frame: on and straight back off the stack.
    fn execute(&mut self, task: QueueItem) {
        let frame = self
            .queues
            .push_stack(&task.text, task.kind, task.duration_ms);
        self.queues.pop_stack_by_id(frame);
    }
}
