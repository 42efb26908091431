//! Note Converter Core Library
//!
//! This library turns files and web links into Markdown notes by driving a
//! remote conversion service, then bundles the notes into one zip archive.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`item`] - Input normalization and the working set of pending items
//! - [`transport`] - HTTP requests with timeout, retry and response decoding
//! - [`convert`] - Mapping items to service requests and responses to results
//! - [`orchestrator`] - Sequential or batched runs with progress reporting
//! - [`packager`] - Zip packaging of converted notes
//! - [`credentials`] - API key handling and persistence
//! - [`config`] - File configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod item;
pub mod orchestrator;
pub mod packager;
pub mod paths;
pub mod transport;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, ConverterConfig, LoadedConfig, load_config, load_default_config};
pub use convert::{ApiBackend, Attachment, ConversionBackend, ConversionResult};
pub use credentials::{ApiKey, FileKeyStore, KeyStorage, KeyStore, KeyStoreError};
pub use error::ConversionError;
pub use item::{
    ConversionItem, ConversionOptions, ItemId, ItemKind, ItemStatus, Normalizer, RawInput,
    ValidationError, WorkingSet,
};
pub use orchestrator::{
    Orchestrator, Outcome, RunEvent, RunOptions, RunReport, RunState, RunStatus,
};
pub use packager::{PackagingError, pack, pack_async};
pub use transport::{
    ApiClient, DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, TransportConfig,
    TransportError, classify_error,
};
