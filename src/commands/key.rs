//! Key command handlers: set, show and clear the stored API key.

use std::path::PathBuf;

use anyhow::{Context, Result};
use note_converter_core::ApiKey;
use note_converter_core::credentials::open_key_store;
use tracing::info;

use crate::ProcessExit;
use crate::app::config_runtime::load_effective_config;
use crate::cli::KeyAction;

pub fn run_key_command(action: &KeyAction, config_path: Option<PathBuf>) -> Result<ProcessExit> {
    let loaded = load_effective_config(config_path, None)?;
    let store = open_key_store(loaded.config.key_storage)
        .context("failed to open API key storage")?;

    match action {
        KeyAction::Set { key } => {
            let key = ApiKey::new(key.as_str())?;
            store.save(&key).context("failed to store API key")?;
            info!("API key stored");
            println!("stored {}", key.masked());
            Ok(ProcessExit::Success)
        }
        KeyAction::Show => match store.load().context("failed to read API key")? {
            Some(key) => {
                println!("{}", key.masked());
                Ok(ProcessExit::Success)
            }
            None => {
                println!("no API key stored");
                Ok(ProcessExit::Failure)
            }
        },
        KeyAction::Clear => {
            if store.clear().context("failed to clear API key")? {
                println!("API key removed");
            } else {
                println!("no API key stored");
            }
            Ok(ProcessExit::Success)
        }
    }
}
