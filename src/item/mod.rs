//! Conversion items: the unit of work submitted to the conversion service.
//!
//! This module provides:
//! - [`ConversionItem`] and its supporting types
//! - [`Normalizer`] for turning raw user input into validated items
//! - [`WorkingSet`] for the user's pending list of items
//!
//! # Example
//!
//! ```
//! use note_converter_core::item::{Normalizer, RawInput};
//!
//! let normalizer = Normalizer::default();
//! let item = normalizer.normalize(RawInput::url("example.com/page")).unwrap();
//! assert_eq!(item.url(), Some("https://example.com/page"));
//! assert_eq!(item.name, "example_com");
//! ```

mod error;
mod media;
mod normalize;
mod working_set;

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

pub use error::{MAX_URL_LENGTH, ValidationError};
pub use media::{DOCX_MEDIA_TYPE, is_allowed_media_type, media_type_from_path};
pub use normalize::{DEFAULT_MAX_FILE_SIZE, Normalizer, NormalizerConfig, derive_name_from_host};
pub use working_set::WorkingSet;

/// Opaque identifier assigned to every normalized item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What kind of source an item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// An uploaded local file.
    File,
    /// A single web page.
    Url,
    /// A page whose linked child pages are crawled as well.
    ParentUrl,
    /// A video link (transcript conversion).
    Video,
    /// An item submitted as part of a batch request.
    BatchMember,
}

impl ItemKind {
    /// Stable label used in logs and CLI output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Url => "url",
            Self::ParentUrl => "parent-url",
            Self::Video => "video",
            Self::BatchMember => "batch-member",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-item conversion options forwarded to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Keep images referenced by the source.
    pub include_images: bool,
    /// Emit front-matter metadata.
    pub include_metadata: bool,
    /// Crawl links found on a parent page. Only meaningful for [`ItemKind::ParentUrl`].
    pub follow_links: bool,
    /// Crawl depth limit; `None` means unlimited.
    pub max_link_depth: Option<u32>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            include_images: true,
            include_metadata: true,
            follow_links: false,
            max_link_depth: None,
        }
    }
}

/// Content an item carries to the service.
#[derive(Clone, PartialEq, Eq)]
pub enum ItemPayload {
    /// Raw file content with its declared media type.
    File {
        /// Original file name, used for the multipart part.
        file_name: String,
        /// Declared media type.
        media_type: String,
        /// File content.
        bytes: Arc<[u8]>,
    },
    /// A validated absolute URL.
    Url(String),
}

impl fmt::Debug for ItemPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File {
                file_name,
                media_type,
                bytes,
            } => f
                .debug_struct("File")
                .field("file_name", file_name)
                .field("media_type", media_type)
                .field("len", &bytes.len())
                .finish(),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

/// Lifecycle of an item within a run.
///
/// `Pending -> Converting -> {Completed | Failed}`; terminal states never
/// transition again within the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemStatus {
    /// Not yet processed.
    #[default]
    Pending,
    /// Request in flight.
    Converting,
    /// Converted successfully.
    Completed,
    /// Conversion failed; see [`ConversionItem::error`].
    Failed,
}

impl ItemStatus {
    /// Returns true for `Completed` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A validated, normalized conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionItem {
    /// Unique identifier, generated at normalization time.
    pub id: ItemId,
    /// Source kind.
    pub kind: ItemKind,
    /// Display name.
    pub name: String,
    /// File bytes or URL.
    pub payload: ItemPayload,
    /// Conversion options.
    pub options: ConversionOptions,
    /// Lifecycle state.
    pub status: ItemStatus,
    /// Last failure reason, cleared on success.
    pub error: Option<String>,
}

impl ConversionItem {
    /// Returns the URL for URL-backed items.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match &self.payload {
            ItemPayload::Url(url) => Some(url),
            ItemPayload::File { .. } => None,
        }
    }

    /// Moves a non-terminal item to `Converting`.
    pub(crate) fn mark_converting(&mut self) {
        if !self.status.is_terminal() {
            self.status = ItemStatus::Converting;
        }
    }

    /// Moves a non-terminal item to `Completed` and clears the error.
    pub(crate) fn mark_completed(&mut self) {
        if !self.status.is_terminal() {
            self.status = ItemStatus::Completed;
            self.error = None;
        }
    }

    /// Moves a non-terminal item to `Failed` with the given reason.
    pub(crate) fn mark_failed(&mut self, reason: impl Into<String>) {
        if !self.status.is_terminal() {
            self.status = ItemStatus::Failed;
            self.error = Some(reason.into());
        }
    }
}

/// Unvalidated user input, as collected by a front end.
///
/// Any `id` supplied here is discarded during normalization.
#[derive(Debug, Clone)]
pub enum RawInput {
    /// A local file.
    File {
        /// File name as shown to the user.
        name: String,
        /// Declared media type.
        media_type: String,
        /// File content.
        bytes: Vec<u8>,
        /// Caller-side identifier, ignored.
        id: Option<String>,
        /// Options override.
        options: Option<ConversionOptions>,
    },
    /// A single page URL.
    Url {
        /// URL as typed.
        url: String,
        /// Optional display name.
        name: Option<String>,
        /// Caller-side identifier, ignored.
        id: Option<String>,
        /// Options override.
        options: Option<ConversionOptions>,
    },
    /// A parent page to crawl.
    ParentUrl {
        /// URL as typed.
        url: String,
        /// Optional display name.
        name: Option<String>,
        /// Caller-side identifier, ignored.
        id: Option<String>,
        /// Options override.
        options: Option<ConversionOptions>,
    },
    /// A video link.
    Video {
        /// URL as typed.
        url: String,
        /// Optional display name.
        name: Option<String>,
        /// Caller-side identifier, ignored.
        id: Option<String>,
        /// Options override.
        options: Option<ConversionOptions>,
    },
}

impl RawInput {
    /// Convenience constructor for a file input.
    #[must_use]
    pub fn file(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::File {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
            id: None,
            options: None,
        }
    }

    /// Convenience constructor for a URL input.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url {
            url: url.into(),
            name: None,
            id: None,
            options: None,
        }
    }

    /// Convenience constructor for a parent-URL input.
    #[must_use]
    pub fn parent_url(url: impl Into<String>) -> Self {
        Self::ParentUrl {
            url: url.into(),
            name: None,
            id: None,
            options: None,
        }
    }

    /// Convenience constructor for a video input.
    #[must_use]
    pub fn video(url: impl Into<String>) -> Self {
        Self::Video {
            url: url.into(),
            name: None,
            id: None,
            options: None,
        }
    }

    /// Replaces the options carried by this input.
    #[must_use]
    pub fn with_options(mut self, new_options: ConversionOptions) -> Self {
        match &mut self {
            Self::File { options, .. }
            | Self::Url { options, .. }
            | Self::ParentUrl { options, .. }
            | Self::Video { options, .. } => *options = Some(new_options),
        }
        self
    }

    /// Sets the display name on URL-like inputs; files keep their own name.
    #[must_use]
    pub fn with_name(mut self, display_name: impl Into<String>) -> Self {
        match &mut self {
            Self::Url { name, .. } | Self::ParentUrl { name, .. } | Self::Video { name, .. } => {
                *name = Some(display_name.into());
            }
            Self::File { .. } => {}
        }
        self
    }
}
