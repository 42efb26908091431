//! Error types for item validation.

use thiserror::Error;

/// Maximum URL length to accept (standard browser limit).
pub const MAX_URL_LENGTH: usize = 2000;

/// Errors raised while validating or normalizing a conversion item.
///
/// Every variant names the input field that failed so callers can point the
/// user at it directly. Validation errors are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A field value failed validation.
    #[error("invalid {field} '{value}': {reason}\n  Suggestion: {suggestion}")]
    InvalidField {
        /// Name of the field that failed (`url`, `file`, `media_type`, ...).
        field: &'static str,
        /// Offending value, truncated for display.
        value: String,
        /// Why the value was rejected.
        reason: String,
        /// How to fix the issue.
        suggestion: String,
    },

    /// File exceeds the configured size limit.
    #[error(
        "file '{name}' is too large ({size} bytes, max {max} bytes)\n  Suggestion: Split the document or raise max_file_size_mb"
    )]
    FileTooLarge {
        /// File name.
        name: String,
        /// Actual size in bytes.
        size: u64,
        /// Configured maximum in bytes.
        max: u64,
    },

    /// The same file or URL is already in the working set.
    #[error("'{value}' has already been added")]
    Duplicate {
        /// The URL or file name that collided.
        value: String,
    },

    /// A run was started with nothing to convert.
    #[error("no items provided for conversion")]
    NoItems,

    /// A run was started without an API key.
    #[error(
        "API key is required\n  Suggestion: Pass --api-key, set NOTE_CONVERTER_API_KEY, or run `note-converter key set`"
    )]
    MissingApiKey,
}

impl ValidationError {
    /// Returns the name of the field that failed validation.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidField { field, .. } => field,
            Self::FileTooLarge { .. } => "file",
            Self::Duplicate { .. } => "item",
            Self::NoItems => "items",
            Self::MissingApiKey => "api_key",
        }
    }

    /// Creates an error for a URL that is blank after trimming.
    #[must_use]
    pub fn empty_url() -> Self {
        Self::InvalidField {
            field: "url",
            value: String::new(),
            reason: "URL is required".to_string(),
            suggestion: "Enter a website address such as example.com/page".to_string(),
        }
    }

    /// Creates an error for a URL that exceeds [`MAX_URL_LENGTH`].
    #[must_use]
    pub fn url_too_long(url: &str) -> Self {
        Self::InvalidField {
            field: "url",
            value: preview(url),
            reason: format!("URL is {} chars, max {MAX_URL_LENGTH}", url.len()),
            suggestion: "Use a URL shortener or check for extraneous content".to_string(),
        }
    }

    /// Creates an error for a URL that does not parse.
    #[must_use]
    pub fn malformed_url(url: &str, parse_error: &str) -> Self {
        Self::InvalidField {
            field: "url",
            value: preview(url),
            reason: parse_error.to_string(),
            suggestion: "Please enter a valid website address".to_string(),
        }
    }

    /// Creates an error for a URL with a non-web scheme.
    #[must_use]
    pub fn unsupported_scheme(url: &str, scheme: &str) -> Self {
        Self::InvalidField {
            field: "url",
            value: preview(url),
            reason: format!("scheme '{scheme}' is not supported"),
            suggestion: "Use http:// or https:// URLs".to_string(),
        }
    }

    /// Creates an error for a host without a dot-separated label.
    #[must_use]
    pub fn invalid_domain(url: &str) -> Self {
        Self::InvalidField {
            field: "url",
            value: preview(url),
            reason: "invalid domain format".to_string(),
            suggestion: "Include a domain with a top-level part (e.g., example.com)".to_string(),
        }
    }

    /// Creates an error for a file with no content.
    #[must_use]
    pub fn empty_file(name: &str) -> Self {
        Self::InvalidField {
            field: "file",
            value: name.to_string(),
            reason: "file is empty".to_string(),
            suggestion: "Choose a file with content".to_string(),
        }
    }

    /// Creates an error for a media type outside the allow-list.
    #[must_use]
    pub fn unsupported_media_type(name: &str, media_type: &str) -> Self {
        Self::InvalidField {
            field: "media_type",
            value: name.to_string(),
            reason: format!("unsupported file type '{media_type}'"),
            suggestion: "Use an image, audio, video, PDF, text, HTML, or DOCX file".to_string(),
        }
    }
}

fn preview(value: &str) -> String {
    value.chars().take(80).collect()
}
