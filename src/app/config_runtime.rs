//! Effective configuration: config file values with command-line overrides applied.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use note_converter_core::{ConverterConfig, LoadedConfig, load_config, load_default_config};
use tracing::debug;

use crate::cli::ServiceArgs;

/// Loads the config file and applies `service` overrides.
///
/// An explicit `--config` path must exist; the default location may be absent.
pub(crate) fn load_effective_config(
    config_path: Option<PathBuf>,
    service: Option<&ServiceArgs>,
) -> Result<LoadedConfig> {
    let mut loaded = match config_path {
        Some(path) => {
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            load_config(Some(path))
        }
        None => load_default_config(),
    }
    .context("failed to load configuration")?;

    if let Some(service) = service {
        apply_service_overrides(&mut loaded.config, service);
        loaded
            .config
            .validate()
            .context("invalid command-line override")?;
    }

    debug!(
        base_url = %loaded.config.base_url,
        max_retries = loaded.config.max_retries,
        from_file = loaded.loaded_from_file,
        "effective configuration"
    );
    Ok(loaded)
}

pub(crate) fn apply_service_overrides(config: &mut ConverterConfig, service: &ServiceArgs) {
    if let Some(base_url) = &service.base_url {
        config.base_url.clone_from(base_url);
    }
    if let Some(max_retries) = service.max_retries {
        config.max_retries = max_retries;
    }
}
