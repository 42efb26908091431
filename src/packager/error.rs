//! Error types for the packager.

use thiserror::Error;

/// Errors that can occur while building the notes archive.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// There is nothing to package.
    #[error("no converted results to package")]
    NoItems,

    /// The zip writer failed.
    #[error("failed to write archive entry '{entry}': {source}")]
    Archive {
        /// Entry being written.
        entry: String,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// Writing entry data failed.
    #[error("failed to write archive data: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking packaging task panicked or was cancelled.
    #[error("packaging task failed: {0}")]
    TaskFailed(String),
}

impl PackagingError {
    pub(crate) fn archive(entry: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            entry: entry.into(),
            source,
        }
    }
}
