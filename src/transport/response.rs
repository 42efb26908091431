//! Content-type aware response decoding.

use serde::Deserialize;

use super::TransportError;

/// An image returned inline in a JSON envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InlineImage {
    /// File name of the image.
    pub name: String,
    /// Base64-encoded image content.
    pub data: String,
}

/// One converted document inside a batch envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResultPayload {
    /// Name of the converted document.
    #[serde(default)]
    pub name: Option<String>,
    /// Markdown content.
    #[serde(default)]
    pub content: String,
    /// Inline images.
    #[serde(default)]
    pub images: Vec<InlineImage>,
}

/// Error object carried by a failed envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Service error code, if any.
    #[serde(default)]
    pub code: Option<String>,
    /// Structured details.
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// The JSON envelope every JSON response uses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiEnvelope {
    /// Whether the service considers the call successful.
    #[serde(default)]
    pub success: bool,
    /// Markdown content for single-item conversions.
    #[serde(default)]
    pub content: Option<String>,
    /// Inline images for single-item conversions.
    #[serde(default)]
    pub images: Vec<InlineImage>,
    /// Per-member results for batch conversions.
    #[serde(default)]
    pub results: Vec<ResultPayload>,
    /// Error object on failure.
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
    /// Top-level message some routes use instead of `error.message`.
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiEnvelope {
    fn failure_message(&self) -> Option<String> {
        self.error
            .as_ref()
            .and_then(|error| error.message.clone())
            .or_else(|| self.message.clone())
    }

    fn failure_details(&self) -> Option<serde_json::Value> {
        self.error.as_ref().and_then(|error| error.details.clone())
    }
}

/// A successfully decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// JSON envelope with `success: true`.
    Json(ApiEnvelope),
    /// Zip or opaque binary content.
    Binary {
        /// Response content type.
        content_type: String,
        /// Raw bytes.
        bytes: Vec<u8>,
    },
    /// Any other content, read as text.
    Text(String),
}

impl ResponseBody {
    /// Returns true for zip payloads.
    #[must_use]
    pub fn is_zip(&self) -> bool {
        matches!(self, Self::Binary { content_type, .. } if is_zip_type(content_type))
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_json_type(content_type: &str) -> bool {
    let essence = essence(content_type);
    essence == "application/json" || essence.ends_with("+json")
}

fn is_zip_type(content_type: &str) -> bool {
    matches!(
        essence(content_type).as_str(),
        "application/zip" | "application/x-zip-compressed"
    )
}

fn is_binary_type(content_type: &str) -> bool {
    is_zip_type(content_type) || essence(content_type) == "application/octet-stream"
}

/// Decodes a response into a [`ResponseBody`] or the matching error.
///
/// Non-2xx statuses become [`TransportError::Rejected`] or
/// [`TransportError::Api`], with the message taken from a JSON body when one
/// can be parsed. A 2xx JSON body must carry `success: true`.
///
/// # Errors
///
/// See above; malformed JSON on a 2xx yields [`TransportError::Decode`].
pub fn decode_response(
    url: &str,
    status: u16,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<ResponseBody, TransportError> {
    if !(200..300).contains(&status) {
        return Err(error_from_body(url, status, bytes));
    }

    let content_type = content_type.unwrap_or_default();
    if is_json_type(content_type) {
        let envelope: ApiEnvelope = serde_json::from_slice(bytes)
            .map_err(|e| TransportError::decode(url, format!("invalid JSON body: {e}")))?;
        if !envelope.success {
            let message = envelope
                .failure_message()
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(TransportError::unsuccessful(
                url,
                status,
                message,
                envelope.failure_details(),
            ));
        }
        return Ok(ResponseBody::Json(envelope));
    }

    if is_binary_type(content_type) {
        return Ok(ResponseBody::Binary {
            content_type: essence(content_type),
            bytes: bytes.to_vec(),
        });
    }

    Ok(ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned()))
}

fn error_from_body(url: &str, status: u16, bytes: &[u8]) -> TransportError {
    let envelope = serde_json::from_slice::<ApiEnvelope>(bytes).ok();
    let message = envelope
        .as_ref()
        .and_then(ApiEnvelope::failure_message)
        .unwrap_or_else(|| format!("HTTP error {status}"));
    let details = envelope.as_ref().and_then(ApiEnvelope::failure_details);
    TransportError::from_status(url, status, message, details)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const URL: &str = "https://api.test/convert/url";

    #[test]
    fn test_json_success_envelope() {
        let body = br##"{"success": true, "content": "# Title", "images": [{"name": "a.png", "data": "AA=="}]}"##;
        let decoded = decode_response(URL, 200, Some("application/json; charset=utf-8"), body).unwrap();
        let ResponseBody::Json(envelope) = decoded else {
            panic!("expected JSON body");
        };
        assert_eq!(envelope.content.as_deref(), Some("# Title"));
        assert_eq!(envelope.images.len(), 1);
    }

    #[test]
    fn test_json_without_success_is_api_error() {
        let body = br#"{"error": {"message": "Scrape blocked", "details": {"host": "x"}}}"#;
        let err = decode_response(URL, 200, Some("application/json"), body).unwrap_err();
        match err {
            TransportError::Api {
                status,
                message,
                details,
                ..
            } => {
                assert_eq!(status, 200);
                assert_eq!(message, "Scrape blocked");
                assert!(details.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        let err = decode_response(URL, 200, Some("application/json"), b"{not json").unwrap_err();
        assert_eq!(err.code(), "DECODE_ERROR");
    }

    #[test]
    fn test_zip_and_octet_stream_are_binary() {
        let zip = decode_response(URL, 200, Some("application/zip"), b"PK\x03\x04").unwrap();
        assert!(zip.is_zip());
        let blob = decode_response(URL, 200, Some("application/octet-stream"), b"\x00\x01").unwrap();
        assert!(matches!(blob, ResponseBody::Binary { ref bytes, .. } if bytes.len() == 2));
        assert!(!blob.is_zip());
    }

    #[test]
    fn test_other_types_are_text() {
        let body = decode_response(URL, 200, Some("text/markdown"), b"# Hi").unwrap();
        assert_eq!(body, ResponseBody::Text("# Hi".to_string()));
        let missing = decode_response(URL, 200, None, b"plain").unwrap();
        assert_eq!(missing, ResponseBody::Text("plain".to_string()));
    }

    #[test]
    fn test_400_uses_envelope_message() {
        let body = br#"{"success": false, "error": {"message": "URL is required"}}"#;
        let err = decode_response(URL, 400, Some("application/json"), body).unwrap_err();
        assert!(matches!(err, TransportError::Rejected { ref message, .. } if message == "URL is required"));
    }

    #[test]
    fn test_500_without_json_uses_status_message() {
        let err = decode_response(URL, 502, Some("text/html"), b"<h1>Bad gateway</h1>").unwrap_err();
        assert!(matches!(err, TransportError::Api { status: 502, ref message, .. } if message == "HTTP error 502"));
    }
}
