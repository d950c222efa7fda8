use crate::render::Renderer;
use std::io::Write;
use std::rc::Rc;
use std::str::FromStr;
use tickline_core::{ManualClock, Millis, Program, RunState, Simulator, Snapshot, TimerQueue};
use tickline_devtools::Inspector;

/// Pause the run at `at_ms` and resume it `length_ms` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseWindow {
    pub at_ms: Millis,
    pub length_ms: Millis,
}

impl FromStr for PauseWindow {
    type Err = String;

    /// Parses `AT:LENGTH`, both in milliseconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (at, length) = s
            .split_once(':')
            .ok_or_else(|| format!("expected AT:LENGTH, got `{s}`"))?;
        let at_ms = at
            .trim()
            .parse()
            .map_err(|e| format!("bad pause time `{at}`: {e}"))?;
        let length_ms = length
            .trim()
            .parse()
            .map_err(|e| format!("bad pause length `{length}`: {e}"))?;
        Ok(Self { at_ms, length_ms })
    }
}

pub struct TraceOptions {
    pub pauses: Vec<PauseWindow>,
    pub panels: bool,
    pub renderer: Renderer,
}

/// Replay `program` on a manual clock, jumping straight from one event to the next.
/// Returns the inspector that watched the run.
pub fn trace(program: Program, options: &TraceOptions, out: &mut impl Write) -> anyhow::Result<Rc<Inspector>> {
    let clock = ManualClock::new();
    let mut simulator = Simulator::new(TimerQueue::new(clock.clone()), program);

    let inspector = Rc::new(Inspector::new());
    {
        let inspector = inspector.clone();
        simulator.subscribe(move |snapshot: &Snapshot| inspector.record(snapshot));
    }

    let mut pauses = options.pauses.clone();
    pauses.sort_by_key(|window| window.at_ms);
    let mut pauses = pauses.into_iter().peekable();

    let mut printed = 0usize;
    simulator.run();
    print_new(&simulator, options, &mut printed, out)?;

    while simulator.state() != RunState::Complete {
        let next_fire = simulator.next_deadline();
        let next_pause = pauses.peek().copied();
        match (next_fire, next_pause) {
            (None, None) => break,
            (Some(fire), Some(pause)) if pause.at_ms < fire => pause_for(&clock, &mut simulator, pause),
            (None, Some(pause)) => pause_for(&clock, &mut simulator, pause),
            (Some(fire), _) => {
                clock.set(fire);
                simulator.tick();
                print_new(&simulator, options, &mut printed, out)?;
                continue;
            }
        }
        pauses.next();
        print_new(&simulator, options, &mut printed, out)?;
    }

    tracing::info!(
        elapsed_ms = simulator.elapsed(),
        fired = simulator.profiling.actions_fired,
        "trace finished"
    );
    Ok(inspector)
}

fn pause_for(clock: &ManualClock, simulator: &mut Simulator<TimerQueue<ManualClock>>, window: PauseWindow) {
    clock.set(window.at_ms);
    simulator.pause();
    clock.advance(window.length_ms);
    simulator.resume();
}

fn print_new(
    simulator: &Simulator<TimerQueue<ManualClock>>,
    options: &TraceOptions,
    printed: &mut usize,
    out: &mut impl Write,
) -> std::io::Result<()> {
    let entries = simulator.queues().entries();
    if entries.len() <= *printed {
        return Ok(());
    }
    for entry in &entries[*printed..] {
        writeln!(out, "{}", options.renderer.log_line(entry))?;
    }
    *printed = entries.len();
    if options.panels {
        writeln!(out, "{}\n", options.renderer.panel(&simulator.snapshot()))?;
    }
    Ok(())
}
