//! Endpoint table of the conversion service.

use std::fmt;

use reqwest::Method;
use url::Url;

use super::TransportError;

/// Default service base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";

/// A route exposed by the conversion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /convert/file` (multipart upload).
    ConvertFile,
    /// `POST /convert/url`.
    ConvertUrl,
    /// `POST /convert/parent-url`.
    ConvertParentUrl,
    /// `POST /convert/youtube`.
    ConvertYoutube,
    /// `POST /convert/batch`.
    ConvertBatch,
    /// `GET /health`.
    Health,
}

impl Endpoint {
    /// Every endpoint, in table order.
    pub const ALL: [Self; 6] = [
        Self::ConvertFile,
        Self::ConvertUrl,
        Self::ConvertParentUrl,
        Self::ConvertYoutube,
        Self::ConvertBatch,
        Self::Health,
    ];

    /// Path relative to the base URL, without a leading slash.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::ConvertFile => "convert/file",
            Self::ConvertUrl => "convert/url",
            Self::ConvertParentUrl => "convert/parent-url",
            Self::ConvertYoutube => "convert/youtube",
            Self::ConvertBatch => "convert/batch",
            Self::Health => "health",
        }
    }

    /// HTTP method the route expects.
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Health => Method::GET,
            _ => Method::POST,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}

/// Absolute endpoint URLs resolved against one base URL.
///
/// Construction validates every URL, so [`Endpoints::url`] cannot fail later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    /// Resolves the endpoint table against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidEndpoint`] when the base URL is not an
    /// absolute http(s) URL or any endpoint fails to parse.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let base = base_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base).map_err(|e| TransportError::InvalidEndpoint {
            url: base.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::InvalidEndpoint {
                url: base,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let endpoints = Self { base };
        for endpoint in Endpoint::ALL {
            let url = endpoints.url(endpoint);
            Url::parse(&url).map_err(|e| TransportError::InvalidEndpoint {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(endpoints)
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the absolute URL for `endpoint`.
    #[must_use]
    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base, endpoint.path())
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls_join_base() {
        let endpoints = Endpoints::new("https://notes.example.com/api/v1/").unwrap();
        assert_eq!(
            endpoints.url(Endpoint::ConvertParentUrl),
            "https://notes.example.com/api/v1/convert/parent-url"
        );
        assert_eq!(
            endpoints.url(Endpoint::Health),
            "https://notes.example.com/api/v1/health"
        );
    }

    #[test]
    fn test_default_base() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.url(Endpoint::ConvertFile),
            "http://localhost:3000/api/v1/convert/file"
        );
    }

    #[test]
    fn test_rejects_relative_base() {
        let err = Endpoints::new("api/v1").unwrap_err();
        assert!(matches!(err, TransportError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_rejects_non_http_base() {
        let err = Endpoints::new("ftp://example.com/api").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_methods() {
        assert_eq!(Endpoint::Health.method(), Method::GET);
        assert_eq!(Endpoint::ConvertBatch.method(), Method::POST);
    }
}
