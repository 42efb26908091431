//! Request transport for the conversion service.
//!
//! This module provides the HTTP layer every conversion goes through:
//!
//! - One pooled client ([`ApiClient`]) with a per-request timeout
//! - Bounded fixed-delay retries for transient failures ([`RetryPolicy`])
//! - Content-type aware decoding of JSON envelopes, zip/binary and text
//!   bodies ([`ResponseBody`])
//! - Uniform error kinds with stable codes ([`TransportError`])
//!
//! # Example
//!
//! ```no_run
//! use note_converter_core::credentials::ApiKey;
//! use note_converter_core::transport::{ApiClient, Endpoint, RequestSpec, TransportConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(TransportConfig::default())?;
//! let key = ApiKey::new("my-key")?;
//! let spec = RequestSpec::json(serde_json::json!({"url": "https://example.com"}))
//!     .with_api_key(Some(&key));
//! let body = client.send(Endpoint::ConvertUrl, &spec).await?;
//! println!("{body:?}");
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod endpoints;
mod error;
mod request;
mod response;
mod retry;

pub use client::{ApiClient, TransportConfig};
pub use constants::{ACCEPT_VALUE, API_KEY_HEADER, CONNECT_TIMEOUT, REQUEST_TIMEOUT, UPLOAD_TIMEOUT};
pub use endpoints::{DEFAULT_BASE_URL, Endpoint, Endpoints};
pub use error::TransportError;
pub use request::{MultipartField, RequestBody, RequestSpec};
pub use response::{
    ApiEnvelope, ApiErrorBody, InlineImage, ResponseBody, ResultPayload, decode_response,
};
pub use retry::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, FailureType, RetryDecision, RetryPolicy,
    classify_error,
};
