//! Fixed-delay retry policy for transient transport failures.
//!
//! When a request fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - may succeed on retry (network, timeout, 5xx)
//! - [`FailureType::Permanent`] - will not succeed on retry (4xx, bad input)
//!
//! The [`RetryPolicy`] then decides whether another attempt is made.
//!
//! # Example
//!
//! ```
//! use note_converter_core::transport::{
//!     FailureType, RetryDecision, RetryPolicy, TransportError, classify_error,
//! };
//!
//! let policy = RetryPolicy::default();
//! let error = TransportError::from_status("https://api.example.com/convert/url", 503, "down", None);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use super::TransportError;

/// Default maximum attempts, including the first one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: connection reset, timeout, 5xx responses.
    Transient,

    /// Failure that will not succeed regardless of retries.
    ///
    /// Examples: 400 Bad Request, 401 Unauthorized, undecodable body.
    Permanent,
}

/// Decision on whether to retry a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// The attempt number about to be made (1-indexed).
        attempt: u32,
    },

    /// Give up and surface the error.
    DoNotRetry {
        /// Human-readable reason why no retry is attempted.
        reason: String,
    },
}

/// Retry configuration: a bounded number of attempts separated by a fixed delay.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `delay`: 1 second
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Delay between attempts.
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with explicit settings. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Creates a policy with a custom `max_attempts` and the default delay.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self::new(max_attempts, DEFAULT_RETRY_DELAY)
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay between attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Decides whether to retry after `attempt` (1-indexed) failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = self.delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay: self.delay,
            attempt: attempt + 1,
        }
    }
}

/// Classifies a transport error for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | Network (connect, reset) | Transient |
/// | Network (TLS/certificate) | Permanent |
/// | Timeout | Transient |
/// | Rejected (400/422) | Permanent |
/// | Api 408, 429, 5xx | Transient |
/// | Api other (incl. 2xx `success: false`) | Permanent |
/// | Decode, InvalidEndpoint | Permanent |
#[must_use]
pub fn classify_error(error: &TransportError) -> FailureType {
    match error {
        TransportError::Network { source, .. } => {
            if is_tls_error(source) {
                FailureType::Permanent
            } else {
                FailureType::Transient
            }
        }
        TransportError::Timeout { .. } => FailureType::Transient,
        TransportError::Api { status, .. } => classify_http_status(*status),
        TransportError::Rejected { .. }
        | TransportError::Decode { .. }
        | TransportError::InvalidEndpoint { .. } => FailureType::Permanent,
    }
}

#[allow(clippy::match_same_arms)]
fn classify_http_status(status: u16) -> FailureType {
    match status {
        408 => FailureType::Transient, // Request Timeout
        429 => FailureType::Transient, // Too Many Requests
        status if (500..600).contains(&status) => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

fn is_tls_error(error: &reqwest::Error) -> bool {
    let error_string = error.to_string().to_lowercase();
    error_string.contains("certificate")
        || error_string.contains("tls")
        || error_string.contains("ssl")
        || error_string.contains("handshake")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const URL: &str = "https://api.test/convert/url";

    // ==================== RetryPolicy Tests ====================

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_retry_policy_max_attempts_minimum_is_one() {
        assert_eq!(RetryPolicy::with_max_attempts(0).max_attempts(), 1);
        assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
    }

    #[test]
    fn test_should_retry_permanent_does_not_retry() {
        let decision = RetryPolicy::default().should_retry(FailureType::Permanent, 1);
        if let RetryDecision::DoNotRetry { reason } = decision {
            assert!(reason.contains("permanent"));
        } else {
            panic!("expected DoNotRetry, got {decision:?}");
        }
    }

    #[test]
    fn test_should_retry_uses_fixed_delay() {
        let policy = RetryPolicy::new(5, Duration::from_millis(250));
        for attempt in 1..5 {
            assert_eq!(
                policy.should_retry(FailureType::Transient, attempt),
                RetryDecision::Retry {
                    delay: Duration::from_millis(250),
                    attempt: attempt + 1,
                }
            );
        }
    }

    #[test]
    fn test_should_retry_respects_max_attempts() {
        let policy = RetryPolicy::with_max_attempts(3);
        assert!(matches!(
            policy.should_retry(FailureType::Transient, 2),
            RetryDecision::Retry { attempt: 3, .. }
        ));
        let decision = policy.should_retry(FailureType::Transient, 3);
        if let RetryDecision::DoNotRetry { reason } = decision {
            assert!(reason.contains("exhausted"));
        } else {
            panic!("expected DoNotRetry, got {decision:?}");
        }
    }

    // ==================== Error Classification Tests ====================

    #[test]
    fn test_classify_server_errors_transient() {
        for status in [500, 502, 503, 504] {
            let error = TransportError::from_status(URL, status, "oops", None);
            assert_eq!(classify_error(&error), FailureType::Transient, "status {status}");
        }
    }

    #[test]
    fn test_classify_client_errors_permanent() {
        for status in [400, 401, 403, 404, 422] {
            let error = TransportError::from_status(URL, status, "nope", None);
            assert_eq!(classify_error(&error), FailureType::Permanent, "status {status}");
        }
    }

    #[test]
    fn test_classify_throttling_transient() {
        let error = TransportError::from_status(URL, 429, "slow down", None);
        assert_eq!(classify_error(&error), FailureType::Transient);
    }

    #[test]
    fn test_classify_unsuccessful_body_permanent() {
        let error = TransportError::unsuccessful(URL, 200, "Conversion failed", None);
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    #[test]
    fn test_classify_timeout_transient() {
        let error = TransportError::timeout(URL, Duration::from_secs(1));
        assert_eq!(classify_error(&error), FailureType::Transient);
    }

    #[test]
    fn test_classify_decode_permanent() {
        let error = TransportError::decode(URL, "bad json");
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    #[test]
    fn test_default_max_retries_constant() {
        assert_eq!(DEFAULT_MAX_RETRIES, 3);
    }
}
