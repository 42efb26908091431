//! CLI entry point for the note converter.

use std::process::ExitCode;

use anyhow::Result;
use tracing::{debug, info};

mod app;
mod cli;
mod commands;

use app::{command_dispatcher, terminal};
use cli::Args;

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every item converted.
    Success,
    /// Some items converted; the archive was still written.
    Partial,
    /// Nothing converted.
    Failure,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Partial => 2,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse_ordered();

    terminal::init_tracing(terminal::default_log_level(args.verbose, args.quiet));

    // Args carry the API key, so only the shape is logged.
    debug!(
        verbose = args.verbose,
        quiet = args.quiet,
        config = ?args.config,
        "CLI arguments parsed"
    );
    info!("Note converter starting");

    let exit = command_dispatcher::dispatch(&args).await?;
    Ok(exit.into())
}

#[cfg(test)]
mod tests {
    use super::ProcessExit;

    #[test]
    fn test_process_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Failure.code(), 1);
        assert_eq!(ProcessExit::Partial.code(), 2);
    }
}
