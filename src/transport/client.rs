//! HTTP client for the conversion service.
//!
//! [`ApiClient`] owns one pooled `reqwest::Client` and issues requests
//! described by [`RequestSpec`], enforcing the per-request timeout and the
//! retry policy.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument, warn};

use super::constants::{ACCEPT_VALUE, API_KEY_HEADER, CONNECT_TIMEOUT, REQUEST_TIMEOUT, UPLOAD_TIMEOUT};
use super::endpoints::{DEFAULT_BASE_URL, Endpoint, Endpoints};
use super::request::{MultipartField, RequestBody, RequestSpec};
use super::response::{ResponseBody, decode_response};
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use super::TransportError;
use crate::user_agent;

/// Settings for [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Service base URL, e.g. `http://localhost:3000/api/v1`.
    pub base_url: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Timeout for JSON requests.
    pub request_timeout: Duration,
    /// Timeout for uploads and batch requests.
    pub upload_timeout: Duration,
    /// Retry policy applied to every request.
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
            upload_timeout: UPLOAD_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Client for the conversion service.
///
/// Cheap to clone; clones share the connection pool. No state is shared
/// between calls beyond the pool.
///
/// # Example
///
/// ```no_run
/// use note_converter_core::transport::{ApiClient, TransportConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(TransportConfig::default())?;
/// client.health().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoints: Endpoints,
    config: TransportConfig,
}

impl ApiClient {
    /// Creates a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidEndpoint`] for a bad base URL, or
    /// [`TransportError::Network`] when the HTTP client cannot be built.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let endpoints = Endpoints::new(&config.base_url)?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|e| TransportError::network(endpoints.base(), e))?;
        Ok(Self {
            client,
            endpoints,
            config,
        })
    }

    /// Returns the resolved endpoint table.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Returns the client settings.
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Sends a request, retrying transient failures per the retry policy.
    ///
    /// When retries are exhausted the last error is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the [`TransportError`] of the final attempt.
    #[instrument(skip(self, spec), fields(endpoint = %endpoint))]
    pub async fn send(
        &self,
        endpoint: Endpoint,
        spec: &RequestSpec,
    ) -> Result<ResponseBody, TransportError> {
        let url = self.endpoints.url(endpoint);
        let timeout = spec.timeout.unwrap_or_else(|| self.default_timeout(endpoint, spec));
        let mut attempt = 1;

        loop {
            let error = match self.send_once(endpoint, &url, spec, timeout).await {
                Ok(body) => {
                    debug!(attempt, "request succeeded");
                    return Ok(body);
                }
                Err(error) => error,
            };

            match self.config.retry.should_retry(classify_error(&error), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    warn!(
                        attempt,
                        code = error.code(),
                        error = %error,
                        delay_ms = delay.as_millis(),
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(attempt, code = error.code(), %reason, "giving up");
                    return Err(error);
                }
            }
        }
    }

    /// Probes `GET {base}/health`. Any 2xx counts as healthy, whatever the body.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the service is unreachable or answers
    /// with a non-2xx status.
    pub async fn health(&self) -> Result<(), TransportError> {
        match self.send(Endpoint::Health, &RequestSpec::empty()).await {
            Ok(_) => Ok(()),
            Err(TransportError::Api { status, .. }) if (200..300).contains(&status) => Ok(()),
            Err(error) => Err(error),
        }
    }

    fn default_timeout(&self, endpoint: Endpoint, spec: &RequestSpec) -> Duration {
        if spec.body.is_multipart() || endpoint == Endpoint::ConvertBatch {
            self.config.upload_timeout
        } else {
            self.config.request_timeout
        }
    }

    async fn send_once(
        &self,
        endpoint: Endpoint,
        url: &str,
        spec: &RequestSpec,
        timeout: Duration,
    ) -> Result<ResponseBody, TransportError> {
        let request = self.build_request(endpoint, url, spec);
        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| map_reqwest_error(url, e, timeout))?;
            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let bytes = response
                .bytes()
                .await
                .map_err(|e| map_reqwest_error(url, e, timeout))?;
            debug!(status, content_type = ?content_type, len = bytes.len(), "response received");
            decode_response(url, status, content_type.as_deref(), &bytes)
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .unwrap_or_else(|_| Err(TransportError::timeout(url, timeout)))
    }

    fn build_request(
        &self,
        endpoint: Endpoint,
        url: &str,
        spec: &RequestSpec,
    ) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(endpoint.method(), url)
            .header(ACCEPT, ACCEPT_VALUE);
        if let Some(key) = &spec.api_key {
            builder = builder.header(API_KEY_HEADER, key.expose());
        }
        match &spec.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)),
        }
    }
}

fn build_form(fields: &[MultipartField]) -> Form {
    fields.iter().fold(Form::new(), |form, field| match field {
        MultipartField::Text { name, value } => form.text(name.clone(), value.clone()),
        MultipartField::File {
            name,
            file_name,
            media_type,
            bytes,
        } => {
            let part = Part::bytes(bytes.to_vec()).file_name(file_name.clone());
            let part = match part.mime_str(media_type) {
                Ok(part) => part,
                Err(_) => {
                    debug!(%media_type, "unparseable media type, sending part untyped");
                    Part::bytes(bytes.to_vec()).file_name(file_name.clone())
                }
            };
            form.part(name.clone(), part)
        }
    })
}

fn map_reqwest_error(url: &str, error: reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(url, timeout)
    } else {
        TransportError::network(url, error)
    }
}
