//! Shared plumbing for the `nixzd` and `isac` binaries.
//!
//! Each tool module declares its clap surface and a `run` function that
//! turns the parsed command into one `HttpRequest` plus a `Directive`.

pub mod isac;
pub mod nixzd;

use std::process::ExitCode;
use std::time::Duration;

use clap::Args;
use hiex_core::ClientError;
use tracing_subscriber::EnvFilter;

/// Output and diagnostics options common to both tools.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Print pretty formatted output
    #[arg(long)]
    pub pretty: bool,

    /// Give up on the call after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CommonArgs {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides `-v`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Report a failed command on stderr and map it to the process exit code.
pub fn finish(result: Result<(), ClientError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, transport = err.is_transport(), "command failed");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
