use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of simulated work. Descriptive only: used for rendering and for
/// settling pending ops by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Kind {
    Fetch,
    Timer,
    Dom,
    Promise,
    AnimationFrame,
    Database,
    ImageLoad,
}

impl Kind {
    pub const ALL: [Kind; 7] = [
        Kind::Fetch,
        Kind::Timer,
        Kind::Dom,
        Kind::Promise,
        Kind::AnimationFrame,
        Kind::Database,
        Kind::ImageLoad,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Fetch => "fetch",
            Kind::Timer => "timer",
            Kind::Dom => "dom",
            Kind::Promise => "promise",
            Kind::AnimationFrame => "animationFrame",
            Kind::Database => "database",
            Kind::ImageLoad => "imageLoad",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of simulated work sitting in a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Unique within a run, handed out in creation order and never reused.
    pub id: u64,
    pub text: String,
    pub kind: Kind,
    /// Informational only; nothing expires an item by duration.
    pub duration_ms: u64,
}
