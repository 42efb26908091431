//! CLI command handlers.

mod config;
mod convert;
mod health;
mod key;

pub use config::run_config_show_command;
pub use convert::run_convert_command;
pub use health::run_health_command;
pub use key::run_key_command;
