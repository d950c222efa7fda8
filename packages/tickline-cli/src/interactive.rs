use crate::render::Renderer;
use anyhow::Result;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tickline_core::{Program, RunState, Simulator, Snapshot, SystemClock, TimerHost, TimerQueue};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands: [g]o  [p]ause/resume  [r]eset  [s]tatus  [q]uit";

pub struct InteractiveOptions {
    pub speed: f64,
    pub exit_on_complete: bool,
    pub renderer: Renderer,
}

/// Play `program` in real time, taking triggers from stdin.
///
/// Everything runs on the current task: timer sleeps and input lines are
/// multiplexed with `select!`, so the simulator is never touched concurrently.
pub async fn run(program: Program, options: InteractiveOptions) -> Result<()> {
    let clock = SystemClock::with_speed(options.speed);
    let mut simulator = Simulator::new(TimerQueue::new(clock), program);
    let renderer = options.renderer;

    // Print log lines as they appear
    let printed = Rc::new(Cell::new(0usize));
    {
        let printed = printed.clone();
        simulator.subscribe(move |snapshot: &Snapshot| {
            if snapshot.log.len() < printed.get() {
                printed.set(0);
            }
            for entry in &snapshot.log[printed.get()..] {
                println!("{}", renderer.log_line(entry));
            }
            printed.set(snapshot.log.len());
        });
    }

    println!("{HELP}");
    tracing::info!(speed = clock.speed(), "interactive run starting");
    simulator.run();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        if options.exit_on_complete && simulator.state() == RunState::Complete {
            break;
        }
        let deadline = simulator.next_deadline();
        if deadline.is_none() && !stdin_open {
            break;
        }
        let wait = deadline
            .map(|at| clock.real_duration(at.saturating_sub(simulator.scheduler().now())))
            .unwrap_or(Duration::from_secs(3600));

        tokio::select! {
            _ = tokio::time::sleep(wait), if deadline.is_some() => {
                simulator.tick();
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed, finishing the current run");
                    finish_unattended(&mut simulator);
                    stdin_open = false;
                    continue;
                };
                match line.trim() {
                    "g" | "go" | "run" => simulator.run(),
                    "p" | "pause" | "resume" => simulator.pause_or_resume(),
                    "r" | "reset" => simulator.reset(),
                    "s" | "status" | "" => println!("{}", renderer.panel(&simulator.snapshot())),
                    "q" | "quit" => break,
                    other => println!("unknown command `{other}`; {HELP}"),
                }
            }
        }
    }

    println!("{}", renderer.panel(&simulator.snapshot()));
    Ok(())
}

/// With no more input nobody can resume a paused run, so resume it here and
/// let it play out.
fn finish_unattended<H: TimerHost>(simulator: &mut Simulator<H>) {
    if simulator.state() == RunState::Paused {
        simulator.resume();
    }
}
