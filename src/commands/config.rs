//! Config command handlers: show effective configuration.

use std::path::PathBuf;

use anyhow::Result;
use note_converter_core::KeyStorage;

use crate::app::config_runtime::load_effective_config;

pub fn run_config_show_command(config_path: Option<PathBuf>) -> Result<()> {
    let loaded = load_effective_config(config_path, None)?;
    let config = &loaded.config;

    let resolved_path = loaded.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if loaded.loaded_from_file {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!("base_url = {}", config.base_url);
    println!("request_timeout_secs = {}", config.request_timeout_secs);
    println!("upload_timeout_secs = {}", config.upload_timeout_secs);
    println!("connect_timeout_secs = {}", config.connect_timeout_secs);
    println!("max_retries = {}", config.max_retries);
    println!("retry_delay_ms = {}", config.retry_delay_ms);
    println!("max_file_size_mb = {}", config.max_file_size_mb);
    println!("inject_www = {}", config.inject_www);
    println!(
        "default_max_depth = {}",
        config
            .default_max_depth
            .map_or_else(|| "unlimited".to_string(), |depth| depth.to_string())
    );
    println!(
        "key_storage = {}",
        match config.key_storage {
            KeyStorage::File => "file",
            KeyStorage::Keychain => "keychain",
        }
    );

    Ok(())
}
