//! Application runtime composition modules.

pub(crate) mod command_dispatcher;
pub(crate) mod config_runtime;
pub(crate) mod exit_handler;
pub(crate) mod inputs;
pub(crate) mod progress;
pub(crate) mod terminal;
