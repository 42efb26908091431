//! Constants for the transport module (timeouts, retry defaults, headers).

use std::time::Duration;

/// Default connect timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default per-request timeout for JSON requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-request timeout for file uploads and batch requests.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Accept header sent with every request.
pub const ACCEPT_VALUE: &str = "application/json, application/zip, application/octet-stream";
