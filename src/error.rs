//! Crate-level error type.

use std::sync::Arc;

use thiserror::Error;

use crate::config::ConfigError;
use crate::credentials::KeyStoreError;
use crate::item::ValidationError;
use crate::packager::PackagingError;
use crate::transport::TransportError;

/// Any failure surfaced by a conversion run or its supporting operations.
///
/// Every variant maps to a stable [`code`](Self::code). The type is `Clone`
/// because one batch-level failure is recorded against every batch member.
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    /// Invalid input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Request to the conversion service failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The archive could not be built.
    #[error(transparent)]
    Packaging(Arc<PackagingError>),

    /// The API key store failed.
    #[error(transparent)]
    KeyStore(Arc<KeyStoreError>),

    /// The configuration is unusable.
    #[error(transparent)]
    Config(Arc<ConfigError>),

    /// The run was cancelled before this item was converted.
    #[error("conversion cancelled")]
    Cancelled,
}

impl ConversionError {
    /// Returns the stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::NoItems) => "NO_ITEMS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Transport(error) => error.code(),
            Self::Packaging(error) if matches!(error.as_ref(), PackagingError::NoItems) => {
                "NO_ITEMS"
            }
            Self::Packaging(_) => "PACKAGING_ERROR",
            Self::KeyStore(_) => "CREDENTIALS_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl From<PackagingError> for ConversionError {
    fn from(error: PackagingError) -> Self {
        Self::Packaging(Arc::new(error))
    }
}

impl From<KeyStoreError> for ConversionError {
    fn from(error: KeyStoreError) -> Self {
        Self::KeyStore(Arc::new(error))
    }
}

impl From<ConfigError> for ConversionError {
    fn from(error: ConfigError) -> Self {
        Self::Config(Arc::new(error))
    }
}
