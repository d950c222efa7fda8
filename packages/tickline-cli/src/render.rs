use tickline_core::{Kind, LogEntry, QueueItem, Snapshot};

/// How one category of item is drawn in the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    /// ANSI SGR color code.
    pub color: &'static str,
    pub badge: &'static str,
}

pub const DEFAULT_STYLE: Style = Style {
    color: "37",
    badge: "task",
};

const STYLES: &[(Kind, Style)] = &[
    (Kind::Fetch, Style { color: "34", badge: "fetch" }),
    (Kind::Timer, Style { color: "33", badge: "timer" }),
    (Kind::Dom, Style { color: "32", badge: "dom" }),
    (Kind::Promise, Style { color: "35", badge: "promise" }),
    (Kind::AnimationFrame, Style { color: "36", badge: "raf" }),
    (Kind::Database, Style { color: "31", badge: "db" }),
    (Kind::ImageLoad, Style { color: "94", badge: "img" }),
];

pub fn style_for(kind: Kind) -> Style {
    STYLES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, style)| *style)
        .unwrap_or(DEFAULT_STYLE)
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    pub color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_owned()
        }
    }

    pub fn item(&self, item: &QueueItem) -> String {
        let style = style_for(item.kind);
        self.paint(style.color, &format!("[{}] {}", style.badge, item.text))
    }

    pub fn log_line(&self, entry: &LogEntry) -> String {
        format!("{} {}", self.paint("2", &format!("{:>6}ms", entry.at_ms)), entry.message)
    }

    fn row<'a>(&self, title: &str, items: impl IntoIterator<Item = &'a QueueItem>) -> String {
        let items: Vec<_> = items.into_iter().map(|item| self.item(item)).collect();
        let body = if items.is_empty() {
            self.paint("2", "(empty)")
        } else {
            items.join("  ")
        };
        format!("{title:<12}{body}")
    }

    /// All four containers plus the run state, one container per line.
    pub fn panel(&self, snapshot: &Snapshot) -> String {
        [
            format!("{:<12}{} at {}ms", "state", snapshot.state, snapshot.now_ms),
            self.row("stack", &snapshot.stack),
            self.row("pending", &snapshot.pending_ops),
            self.row("microtasks", &snapshot.microtasks),
            self.row("macrotasks", &snapshot.macrotasks),
        ]
        .join("\n")
    }
}
