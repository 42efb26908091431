//! Health command handler: probes the conversion service.

use std::path::PathBuf;

use anyhow::{Context, Result};
use note_converter_core::ApiClient;
use tracing::{error, info};

use crate::ProcessExit;
use crate::app::config_runtime::load_effective_config;
use crate::cli::ServiceArgs;

pub async fn run_health_command(
    service: &ServiceArgs,
    config_path: Option<PathBuf>,
) -> Result<ProcessExit> {
    let loaded = load_effective_config(config_path, Some(service))?;
    let client = ApiClient::new(loaded.config.transport_config())
        .context("failed to build HTTP client")?;
    let base = client.endpoints().base().to_string();

    match client.health().await {
        Ok(_) => {
            info!(%base, "conversion service is healthy");
            println!("ok {base}");
            Ok(ProcessExit::Success)
        }
        Err(err) => {
            error!(%base, code = err.code(), error = %err, "health check failed");
            println!("unreachable {base}: {err}");
            Ok(ProcessExit::Failure)
        }
    }
}
