//! File configuration for conversion defaults.
//!
//! Loaded from `<config dir>/config.toml`. Every field is optional; absent
//! fields take the defaults below and command-line flags override both.
//!
//! ```toml
//! base_url = "https://notes.example.com/api/v1"
//! max_retries = 5
//! retry_delay_ms = 2000
//! default_max_depth = 2
//! key_storage = "keychain"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::credentials::KeyStorage;
use crate::item::NormalizerConfig;
use crate::paths::default_config_dir;
use crate::transport::{
    DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, Endpoints, RetryPolicy, TransportConfig,
};

/// File name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("failed to parse config file: {source}")]
    Parse {
        /// TOML error, with line information.
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid config value for `{field}`: {value}. Expected: {expected}")]
    Invalid {
        /// Offending key.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Allowed values.
        expected: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, value: impl ToString, expected: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

/// Conversion defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Service base URL.
    pub base_url: String,
    /// Timeout for JSON requests, in seconds.
    pub request_timeout_secs: u64,
    /// Timeout for uploads and batch requests, in seconds.
    pub upload_timeout_secs: u64,
    /// TCP connect timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// Maximum attempts per request, including the first (1..=10).
    pub max_retries: u32,
    /// Fixed delay between attempts, in milliseconds (0..=60000).
    pub retry_delay_ms: u64,
    /// Maximum upload size, in MiB.
    pub max_file_size_mb: u64,
    /// Insert a `www.` label into bare two-label hosts.
    pub inject_www: bool,
    /// Default crawl depth for parent URLs; absent means unlimited.
    pub default_max_depth: Option<u32>,
    /// Where the API key is persisted.
    pub key_storage: KeyStorage,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            upload_timeout_secs: 120,
            connect_timeout_secs: 10,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: 1_000,
            max_file_size_mb: 50,
            inject_www: false,
            default_max_depth: None,
            key_storage: KeyStorage::File,
        }
    }
}

impl ConverterConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, plus the
    /// errors of [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Endpoints::new(&self.base_url)
            .map_err(|e| ConfigError::invalid("base_url", &self.base_url, e.to_string()))?;
        validate_timeout_secs("request_timeout_secs", self.request_timeout_secs)?;
        validate_timeout_secs("upload_timeout_secs", self.upload_timeout_secs)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        if !(1..=10).contains(&self.max_retries) {
            return Err(ConfigError::invalid("max_retries", self.max_retries, "range 1..=10"));
        }
        if self.retry_delay_ms > 60_000 {
            return Err(ConfigError::invalid(
                "retry_delay_ms",
                self.retry_delay_ms,
                "range 0..=60000",
            ));
        }
        if !(1..=1024).contains(&self.max_file_size_mb) {
            return Err(ConfigError::invalid(
                "max_file_size_mb",
                self.max_file_size_mb,
                "range 1..=1024",
            ));
        }
        Ok(())
    }

    /// Transport settings derived from this config.
    #[must_use]
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            upload_timeout: Duration::from_secs(self.upload_timeout_secs),
            retry: RetryPolicy::new(
                self.max_retries,
                Duration::from_millis(self.retry_delay_ms),
            ),
        }
    }

    /// Normalizer settings derived from this config.
    #[must_use]
    pub fn normalizer_config(&self) -> NormalizerConfig {
        NormalizerConfig {
            max_file_size: self.max_file_size_mb * 1024 * 1024,
            inject_www: self.inject_www,
            default_max_depth: self.default_max_depth,
        }
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if !(1..=3600).contains(&value) {
        return Err(ConfigError::invalid(field, value, "range 1..=3600"));
    }
    Ok(())
}

/// Config plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path, if a config directory is known.
    pub path: Option<PathBuf>,
    /// Effective configuration (defaults when no file exists).
    pub config: ConverterConfig,
    /// Whether a file was read.
    pub loaded_from_file: bool,
}

/// Returns `<config dir>/config.toml`.
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Loads the config at `path` when it exists, defaults otherwise.
///
/// # Errors
///
/// Returns [`ConfigError`] when an existing file cannot be read or is invalid.
pub fn load_config(path: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    match path.as_deref() {
        Some(file) if file.exists() => {
            let config = ConverterConfig::load(file)?;
            debug!(path = %file.display(), "loaded config file");
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            config: ConverterConfig::default(),
            loaded_from_file: false,
        }),
    }
}

/// Loads the config from the default location.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_default_config() -> Result<LoadedConfig, ConfigError> {
    load_config(resolve_default_config_path())
}
