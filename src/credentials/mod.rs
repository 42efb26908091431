//! API key handling.
//!
//! [`ApiKey`] wraps the opaque key the conversion service expects in the
//! `x-api-key` header. Its `Debug` and `Display` output is redacted so the key
//! never reaches logs. [`KeyStore`] implementations persist it between runs.

mod store;

use std::fmt;

use crate::item::ValidationError;

pub use store::{
    API_KEY_ENV, CREDENTIALS_FILE_NAME, FileKeyStore, KEY_ENTRY_NAME, KeyStorage, KeyStore,
    KeyStoreError, KeychainKeyStore, open_key_store, resolve_api_key,
};

const REDACTED: &str = "<redacted>";

/// The caller's API key. Never blank; surrounding whitespace is trimmed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingApiKey`] when `value` is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingApiKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the raw key for the request header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked form for display: the first four characters followed by `*`.
    #[must_use]
    pub fn masked(&self) -> String {
        let visible = if self.0.chars().count() > 8 { 4 } else { 0 };
        let prefix: String = self.0.chars().take(visible).collect();
        format!("{prefix}{}", "*".repeat(8))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&REDACTED).finish()
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_trims() {
        let key = ApiKey::new("  abc123  ").unwrap();
        assert_eq!(key.expose(), "abc123");
    }

    #[test]
    fn test_blank_key_rejected() {
        assert_eq!(ApiKey::new("   ").unwrap_err(), ValidationError::MissingApiKey);
        assert_eq!(ApiKey::new("").unwrap_err(), ValidationError::MissingApiKey);
    }

    #[test]
    fn test_debug_and_display_are_redacted() {
        let key = ApiKey::new("sk-very-secret").unwrap();
        assert!(!format!("{key:?}").contains("sk-very-secret"));
        assert!(!format!("{key}").contains("sk-very-secret"));
        assert_eq!(format!("{key}"), "<redacted>");
    }

    #[test]
    fn test_masked() {
        assert_eq!(ApiKey::new("abcdefghijkl").unwrap().masked(), "abcd********");
        assert_eq!(ApiKey::new("short").unwrap().masked(), "********");
    }
}
