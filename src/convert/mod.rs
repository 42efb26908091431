//! Conversion backends: from a [`ConversionItem`] to a [`ConversionResult`].
//!
//! [`ConversionBackend`] is the seam the orchestrator drives. [`ApiBackend`]
//! implements it against the remote service; tests substitute their own.

mod api;
mod decode;

use async_trait::async_trait;

use crate::credentials::ApiKey;
use crate::error::ConversionError;
use crate::item::ConversionItem;

pub use api::ApiBackend;
pub use decode::{batch_results, single_result};

/// A file produced alongside a note (image, figure, transcript asset).
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name, possibly with a relative directory.
    pub name: String,
    /// File content.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The converted form of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// Name the note is packaged under (extension replaced with `.md`).
    pub name: String,
    /// Markdown text.
    pub content_text: String,
    /// Files referenced by the note.
    pub attachments: Vec<Attachment>,
}

impl ConversionResult {
    /// A text-only result.
    #[must_use]
    pub fn text(name: impl Into<String>, content_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_text: content_text.into(),
            attachments: Vec::new(),
        }
    }
}

/// Something that can convert items.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Converts one item.
    ///
    /// # Errors
    ///
    /// Returns the failure for this item; other items are unaffected.
    async fn convert_item(
        &self,
        item: &ConversionItem,
        api_key: &ApiKey,
    ) -> Result<ConversionResult, ConversionError>;

    /// Converts several items in one request. Results are in item order.
    ///
    /// # Errors
    ///
    /// A single error fails the whole batch.
    async fn convert_batch(
        &self,
        items: &[ConversionItem],
        api_key: &ApiKey,
    ) -> Result<Vec<ConversionResult>, ConversionError>;
}
