mod interactive;
mod render;
mod trace;

use anyhow::Result;
use clap::{Parser, Subcommand};
use render::Renderer;
use tickline_core::Program;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tickline")]
#[command(about = "Step through an event loop: call stack, pending ops, microtasks, macrotasks", long_about = None)]
struct Cli {
    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the scenario in real time with pause/resume/reset from stdin
    Run {
        /// Simulated milliseconds per real millisecond
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Exit as soon as the scenario completes
        #[arg(long)]
        exit_on_complete: bool,
    },
    /// Replay the scenario instantly on a simulated clock
    Trace {
        /// Pause window as AT:LENGTH in ms, e.g. 700:4300 (repeatable)
        #[arg(long = "pause", value_name = "AT:LENGTH")]
        pauses: Vec<trace::PauseWindow>,
        /// Render the containers after every step
        #[arg(long)]
        panels: bool,
        /// Print the inspector state as JSON at the end
        #[arg(long)]
        json: bool,
    },
    /// Print the scenario's steps as JSON
    Program,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let renderer = Renderer::new(!cli.no_color);

    match cli.command {
        Commands::Run {
            speed,
            exit_on_complete,
        } => {
            interactive::run(
                Program::canonical(),
                interactive::InteractiveOptions {
                    speed,
                    exit_on_complete,
                    renderer,
                },
            )
            .await?;
        }
        Commands::Trace {
            pauses,
            panels,
            json,
        } => {
            let options = trace::TraceOptions {
                pauses,
                panels,
                renderer,
            };
            let mut stdout = std::io::stdout().lock();
            let inspector = trace::trace(Program::canonical(), &options, &mut stdout)?;
            if json {
                use std::io::Write;
                writeln!(stdout, "{}", inspector.export_state())?;
            }
        }
        Commands::Program => {
            println!("{}", serde_json::to_string_pretty(&Program::canonical())?);
        }
    }

    Ok(())
}
