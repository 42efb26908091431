//! Error types for the transport module.
//!
//! Every variant carries the URL it concerns so failures can be reported
//! without additional context from the caller.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the conversion service.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused or reset, TLS).
    #[error("network error calling {url}: {source}")]
    Network {
        /// The URL that was being called.
        url: String,
        /// The underlying network error.
        #[source]
        source: Arc<reqwest::Error>,
    },

    /// The request did not complete within its timeout.
    #[error("request to {url} timed out after {}s", after.as_secs())]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// The timeout that expired.
        after: Duration,
    },

    /// The service rejected the request as invalid (HTTP 400 / 422).
    #[error("request rejected by {url} (HTTP {status}): {message}")]
    Rejected {
        /// The URL that rejected the request.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Message reported by the service.
        message: String,
        /// Structured details reported by the service, if any.
        details: Option<serde_json::Value>,
    },

    /// The service reported a failure.
    ///
    /// `status` is the HTTP status of the response; a 2xx status means the
    /// body carried `success: false`.
    #[error("conversion service error from {url} (HTTP {status}): {message}")]
    Api {
        /// The URL that reported the failure.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Message reported by the service.
        message: String,
        /// Structured details reported by the service, if any.
        details: Option<serde_json::Value>,
    },

    /// The response body could not be decoded.
    #[error("could not decode response from {url}: {reason}")]
    Decode {
        /// The URL whose response failed to decode.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// The configured base URL does not produce a valid endpoint.
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint {
        /// The endpoint URL that failed to parse.
        url: String,
        /// Parse error.
        reason: String,
    },
}

impl TransportError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            after,
        }
    }

    /// Creates an error for a non-success HTTP status, choosing between
    /// [`Rejected`](Self::Rejected) and [`Api`](Self::Api).
    pub fn from_status(
        url: impl Into<String>,
        status: u16,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        let url = url.into();
        let message = message.into();
        if matches!(status, 400 | 422) {
            Self::Rejected {
                url,
                status,
                message,
                details,
            }
        } else {
            Self::Api {
                url,
                status,
                message,
                details,
            }
        }
    }

    /// Creates an error for a 2xx JSON body that reported `success: false`.
    pub fn unsuccessful(
        url: impl Into<String>,
        status: u16,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self::Api {
            url: url.into(),
            status,
            message: message.into(),
            details,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network { .. } | Self::InvalidEndpoint { .. } => "NETWORK_ERROR",
            Self::Timeout { .. } => "TIMEOUT_ERROR",
            Self::Rejected { .. } => "VALIDATION_ERROR",
            Self::Api { .. } => "API_ERROR",
            Self::Decode { .. } => "DECODE_ERROR",
        }
    }

    /// Returns the HTTP status when the service responded.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// No `From<reqwest::Error>`: every variant needs the URL, which the source
// error does not reliably carry. Use the constructor helpers instead.
