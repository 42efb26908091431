//! Request descriptions handed to [`ApiClient::send`](super::ApiClient::send).
//!
//! A [`RequestSpec`] is plain data so the client can rebuild the HTTP request
//! for every retry attempt.

use std::sync::Arc;
use std::time::Duration;

use crate::credentials::ApiKey;

/// One field of a multipart form.
#[derive(Clone, PartialEq, Eq)]
pub enum MultipartField {
    /// A plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// A file part.
    File {
        /// Field name.
        name: String,
        /// File name sent in the part's disposition.
        file_name: String,
        /// Part content type.
        media_type: String,
        /// File content.
        bytes: Arc<[u8]>,
    },
}

impl std::fmt::Debug for MultipartField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text { name, value } => f
                .debug_struct("Text")
                .field("name", name)
                .field("value", value)
                .finish(),
            Self::File {
                name,
                file_name,
                media_type,
                bytes,
            } => f
                .debug_struct("File")
                .field("name", name)
                .field("file_name", file_name)
                .field("media_type", media_type)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

/// Body of a request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document.
    Json(serde_json::Value),
    /// Multipart form.
    Multipart(Vec<MultipartField>),
}

impl RequestBody {
    /// Returns true for multipart bodies.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

/// Everything needed to issue one logical request.
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    /// Request body.
    pub body: RequestBody,
    /// Key sent in the `x-api-key` header; omitted when `None`.
    pub api_key: Option<ApiKey>,
    /// Per-request timeout override.
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    /// A request without a body.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A JSON request.
    #[must_use]
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            body: RequestBody::Json(value),
            ..Self::default()
        }
    }

    /// A multipart request.
    #[must_use]
    pub fn multipart(fields: Vec<MultipartField>) -> Self {
        Self {
            body: RequestBody::Multipart(fields),
            ..Self::default()
        }
    }

    /// Attaches an API key.
    #[must_use]
    pub fn with_api_key(mut self, key: Option<&ApiKey>) -> Self {
        self.api_key = key.cloned();
        self
    }

    /// Overrides the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
