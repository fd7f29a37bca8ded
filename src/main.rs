use std::{process::ExitCode, time::Duration};

use clap::{error::ErrorKind, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use semqueue::{ConfigError, DelayMode, DrainStrategy, Error, Orchestrator, Stdout, TaskConfig};

/// Run producers and consumers over a shared bounded buffer.
#[derive(Parser, Debug)]
#[command(name = "semqueue", version)]
struct Cli {
    /// Number of producer threads (at most 16).
    producers: usize,

    /// Number of consumer threads (at most 16).
    consumers: usize,

    /// Items each producer inserts.
    items_per_producer: usize,

    /// Buffer capacity in items.
    capacity: usize,

    /// 1 = producers sleep after each insert, 0 = consumers sleep after each remove.
    #[arg(allow_negative_numbers = true)]
    delay_mode: i64,

    /// Pacing interval in milliseconds.
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// How to detect that the buffer has drained.
    #[arg(long, value_enum, default_value_t = DrainStrategy::Completion)]
    drain: DrainStrategy,

    /// Do not print the per-item trace.
    #[arg(long)]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> Result<TaskConfig, ConfigError> {
        let delay_mode = DelayMode::from_flag(self.delay_mode)?;
        Ok(TaskConfig::new(
            self.producers,
            self.consumers,
            self.items_per_producer,
            self.capacity,
            delay_mode,
        )
        .with_delay(Duration::from_millis(self.delay_ms))
        .with_drain(self.drain))
    }
}

fn fail(err: &Error) -> ExitCode {
    debug!(error = ?err, "run aborted");
    eprintln!("ERROR: {err}");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            ErrorKind::MissingRequiredArgument => {
                return fail(&ConfigError::MissingArguments { expected: 5 }.into());
            }
            _ => {
                let _ = err.print();
                return ExitCode::FAILURE;
            }
        },
    };

    let quiet = cli.quiet;
    let orchestrator = match cli.into_config().and_then(Orchestrator::new) {
        Ok(orchestrator) => orchestrator,
        Err(err) => return fail(&err.into()),
    };
    let orchestrator = if quiet {
        orchestrator
    } else {
        orchestrator.with_trace(Stdout)
    };

    match orchestrator.run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}
