//! CLI command routing: runs the subcommand and returns its exit outcome.

use anyhow::Result;

use crate::cli::{Args, Command, ConfigAction};
use crate::{ProcessExit, commands};

pub(crate) async fn dispatch(args: &Args) -> Result<ProcessExit> {
    match &args.command {
        Command::Convert(convert_args) => {
            commands::run_convert_command(convert_args, args.config.clone(), args.quiet).await
        }
        Command::Health(service) => commands::run_health_command(service, args.config.clone()).await,
        Command::Key { action } => commands::run_key_command(action, args.config.clone()),
        Command::Config {
            action: ConfigAction::Show,
        } => {
            commands::run_config_show_command(args.config.clone())?;
            Ok(ProcessExit::Success)
        }
    }
}
