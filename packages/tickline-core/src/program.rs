use crate::item::Kind;
use serde::{Deserialize, Serialize};
use tickline_scheduler::Millis;

/// What a scheduled step does when it fires. Interpreted by the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    PushStack {
        text: String,
        kind: Kind,
    },
    PopStack {
        text: String,
    },
    /// Pop `frame` off the stack and park an async op in pending ops.
    StackToPending {
        frame: String,
        text: String,
        kind: Kind,
        duration_ms: u64,
    },
    /// Pop `frame` off the stack and queue its continuation as a microtask.
    StackToMicrotask {
        frame: String,
        text: String,
        kind: Kind,
    },
    /// Finish every pending op of `kind`, queueing `text` as a macrotask for each.
    SettlePending {
        kind: Kind,
        text: String,
    },
    DrainMicrotasks,
    /// Process the macrotask queue one task per tick, with a microtask
    /// checkpoint after each.
    RunMacrotasks,
    Complete,
}

/// An action and when it fires, measured from the start of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub at_ms: Millis,
    pub action: Action,
}

impl Step {
    pub fn new(at_ms: Millis, action: Action) -> Self {
        Self { at_ms, action }
    }
}

/// A fixed list of steps, all scheduled at once when a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Program {
    steps: Vec<Step>,
}

impl Program {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The image-load / database / promise walkthrough.
    pub fn canonical() -> Self {
        use Action::*;

        let s = |text: &str| text.to_owned();
        Self::new(vec![
            Step::new(0, PushStack { text: s("main()"), kind: Kind::Dom }),
            Step::new(500, PushStack { text: s("loadImage()"), kind: Kind::ImageLoad }),
            Step::new(
                1000,
                StackToPending {
                    frame: s("loadImage()"),
                    text: s("Image load"),
                    kind: Kind::ImageLoad,
                    duration_ms: 2000,
                },
            ),
            Step::new(1500, PushStack { text: s("queryDatabase()"), kind: Kind::Database }),
            Step::new(
                2000,
                StackToPending {
                    frame: s("queryDatabase()"),
                    text: s("Database query"),
                    kind: Kind::Database,
                    duration_ms: 1500,
                },
            ),
            Step::new(2500, PushStack { text: s("Promise.resolve()"), kind: Kind::Promise }),
            Step::new(
                3000,
                StackToMicrotask {
                    frame: s("Promise.resolve()"),
                    text: s("Promise callback"),
                    kind: Kind::Promise,
                },
            ),
            Step::new(3500, PopStack { text: s("main()") }),
            Step::new(4000, SettlePending { kind: Kind::ImageLoad, text: s("Image onload") }),
            Step::new(4500, SettlePending { kind: Kind::Database, text: s("Database callback") }),
            Step::new(5000, DrainMicrotasks),
            Step::new(5500, RunMacrotasks),
            Step::new(6000, Complete),
        ])
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Time of the last step.
    pub fn duration(&self) -> Millis {
        self.steps.iter().map(|step| step.at_ms).max().unwrap_or(0)
    }
}
