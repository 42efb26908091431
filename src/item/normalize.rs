//! Validation and canonicalization of raw user input into [`ConversionItem`]s.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, instrument};
use url::Url;

use super::error::{MAX_URL_LENGTH, ValidationError};
use super::media::is_allowed_media_type;
use super::{ConversionItem, ConversionOptions, ItemId, ItemKind, ItemPayload, ItemStatus, RawInput};

/// Default maximum upload size (50 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

#[allow(clippy::expect_used)]
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

#[allow(clippy::expect_used)]
static HAS_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("scheme regex is valid")
});

/// At least one dot with content on both sides.
#[allow(clippy::expect_used)]
static HOST_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^.]+\.[^.]+").expect("host label regex is valid"));

/// Settings that control normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Largest accepted file, in bytes.
    pub max_file_size: u64,
    /// Prefix hosts with `www.` when missing.
    pub inject_www: bool,
    /// Crawl depth applied to parent URLs that carry no explicit options.
    pub default_max_depth: Option<u32>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            inject_www: false,
            default_max_depth: None,
        }
    }
}

/// Turns [`RawInput`] into validated [`ConversionItem`]s.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Creates a normalizer with the given settings.
    #[must_use]
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Returns the active settings.
    #[must_use]
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Validates and canonicalizes one input.
    ///
    /// Every returned item carries a freshly generated id, even when the
    /// input supplied one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the failing field when the file is
    /// too large, empty, or of a disallowed type, or when the URL is blank,
    /// malformed, non-web, or lacks a dotted host.
    #[instrument(level = "debug", skip(self, raw))]
    pub fn normalize(&self, raw: RawInput) -> Result<ConversionItem, ValidationError> {
        let item = match raw {
            RawInput::File {
                name,
                media_type,
                bytes,
                options,
                ..
            } => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(ValidationError::InvalidField {
                        field: "name",
                        value: String::new(),
                        reason: "file name is required".to_string(),
                        suggestion: "Give the file a name".to_string(),
                    });
                }
                self.validate_file(&name, &media_type, bytes.len() as u64)?;
                build_item(
                    ItemKind::File,
                    name.clone(),
                    ItemPayload::File {
                        file_name: name,
                        media_type,
                        bytes: Arc::from(bytes),
                    },
                    single_page_options(options),
                )
            }
            RawInput::Url {
                url, name, options, ..
            } => self.url_item(ItemKind::Url, &url, name, single_page_options(options))?,
            RawInput::Video {
                url, name, options, ..
            } => self.url_item(ItemKind::Video, &url, name, single_page_options(options))?,
            RawInput::ParentUrl {
                url, name, options, ..
            } => {
                let options = options.unwrap_or_else(|| ConversionOptions {
                    max_link_depth: self.config.default_max_depth,
                    ..ConversionOptions::default()
                });
                self.url_item(ItemKind::ParentUrl, &url, name, options)?
            }
        };

        debug!(id = %item.id, kind = %item.kind, name = %item.name, "normalized item");
        Ok(item)
    }

    /// Validates a file's size and declared media type.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::FileTooLarge`] above the configured limit,
    /// and `InvalidField` for empty files or disallowed media types.
    pub fn validate_file(&self, name: &str, media_type: &str, size: u64) -> Result<(), ValidationError> {
        if size > self.config.max_file_size {
            return Err(ValidationError::FileTooLarge {
                name: name.to_string(),
                size,
                max: self.config.max_file_size,
            });
        }
        if size == 0 {
            return Err(ValidationError::empty_file(name));
        }
        if !is_allowed_media_type(media_type) {
            return Err(ValidationError::unsupported_media_type(name, media_type));
        }
        Ok(())
    }

    /// Normalizes a URL string.
    ///
    /// Removes all whitespace, drops a leading `//`, prefixes `https://` when
    /// no scheme is present, and optionally injects `www.`. An input that
    /// already has a scheme is returned as-is apart from whitespace removal.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the result is blank, too long, does
    /// not parse, is not http(s), or has a host without a dot-separated label.
    pub fn normalize_url(&self, raw: &str) -> Result<String, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_url());
        }

        let stripped = WHITESPACE.replace_all(trimmed, "");
        let collapsed: &str = stripped.strip_prefix("//").unwrap_or(&stripped);
        if collapsed.is_empty() {
            return Err(ValidationError::empty_url());
        }
        if collapsed.len() > MAX_URL_LENGTH {
            return Err(ValidationError::url_too_long(collapsed));
        }

        let candidate = if HAS_SCHEME.is_match(collapsed) {
            collapsed.to_string()
        } else {
            format!("https://{collapsed}")
        };

        let mut parsed = Url::parse(&candidate)
            .map_err(|e| ValidationError::malformed_url(raw.trim(), &e.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => return Err(ValidationError::unsupported_scheme(raw.trim(), scheme)),
        }

        let host = parsed
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| ValidationError::invalid_domain(raw.trim()))?;
        if !HOST_LABEL.is_match(&host) {
            return Err(ValidationError::invalid_domain(raw.trim()));
        }

        if self.config.inject_www
            && !host.starts_with("www.")
            && matches!(parsed.host(), Some(url::Host::Domain(_)))
        {
            let with_www = format!("www.{host}");
            parsed
                .set_host(Some(&with_www))
                .map_err(|e| ValidationError::malformed_url(raw.trim(), &e.to_string()))?;
            return Ok(parsed.to_string());
        }

        Ok(candidate)
    }

    fn url_item(
        &self,
        kind: ItemKind,
        raw_url: &str,
        name: Option<String>,
        options: ConversionOptions,
    ) -> Result<ConversionItem, ValidationError> {
        let url = self.normalize_url(raw_url)?;
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| derive_name_from_host(&url));
        Ok(build_item(kind, name, ItemPayload::Url(url), options))
    }
}

/// Derives a display name from a URL's host, replacing every
/// non-alphanumeric character with `_` (`example.com` becomes `example_com`).
#[must_use]
pub fn derive_name_from_host(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "page".to_string());
    host.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn single_page_options(options: Option<ConversionOptions>) -> ConversionOptions {
    ConversionOptions {
        follow_links: false,
        max_link_depth: None,
        ..options.unwrap_or_default()
    }
}

fn build_item(
    kind: ItemKind,
    name: String,
    payload: ItemPayload,
    options: ConversionOptions,
) -> ConversionItem {
    ConversionItem {
        id: ItemId::new(),
        kind,
        name,
        payload,
        options,
        status: ItemStatus::Pending,
        error: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::default()
    }

    // ==================== URL Normalization ====================

    #[test]
    fn test_bare_host_gets_https_prefix() {
        let url = normalizer().normalize_url("example.com/page").unwrap();
        assert_eq!(url, "https://example.com/page");
        assert!(Url::parse(&url).is_ok());
    }

    #[test]
    fn test_internal_whitespace_is_removed() {
        let url = normalizer().normalize_url("  exa mple.com/pa\tge ").unwrap();
        assert_eq!(url, "https://example.com/page");
    }

    #[test]
    fn test_protocol_relative_url() {
        let url = normalizer().normalize_url("//example.com/a").unwrap();
        assert_eq!(url, "https://example.com/a");
    }

    #[test]
    fn test_schemed_url_left_untouched() {
        let url = normalizer().normalize_url("http://example.com").unwrap();
        assert_eq!(url, "http://example.com");
    }

    #[test]
    fn test_blank_url_rejected() {
        let err = normalizer().normalize_url("   ").unwrap_err();
        assert_eq!(err.field(), "url");
    }

    #[test]
    fn test_not_a_url_rejected() {
        // Whitespace removal yields "notaurl", which has no dotted host.
        let err = normalizer().normalize_url("not a url").unwrap_err();
        assert_eq!(err.field(), "url");
    }

    #[test]
    fn test_bare_hostname_without_tld_rejected() {
        assert!(normalizer().normalize_url("localhost").is_err());
        assert!(normalizer().normalize_url("https://intranet/page").is_err());
    }

    #[test]
    fn test_non_web_scheme_rejected() {
        let err = normalizer()
            .normalize_url("ftp://files.example.com/a.pdf")
            .unwrap_err();
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn test_overlong_url_rejected() {
        let long = format!("example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(normalizer().normalize_url(&long).is_err());
    }

    #[test]
    fn test_inject_www_when_configured() {
        let normalizer = Normalizer::new(NormalizerConfig {
            inject_www: true,
            ..NormalizerConfig::default()
        });
        let url = normalizer.normalize_url("example.com/page").unwrap();
        assert_eq!(url, "https://www.example.com/page");

        let already = normalizer.normalize_url("www.example.com").unwrap();
        assert_eq!(already, "https://www.example.com");
    }

    // ==================== File Validation ====================

    #[test]
    fn test_validate_file_size_boundary() {
        let n = normalizer();
        assert!(
            n.validate_file("a.pdf", "application/pdf", DEFAULT_MAX_FILE_SIZE)
                .is_ok()
        );
        let err = n
            .validate_file("a.pdf", "application/pdf", DEFAULT_MAX_FILE_SIZE + 1)
            .unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
    }

    #[test]
    fn test_validate_file_rejects_disallowed_type() {
        let err = normalizer()
            .validate_file("a.zip", "application/zip", 10)
            .unwrap_err();
        assert_eq!(err.field(), "media_type");
    }

    #[test]
    fn test_validate_file_rejects_empty() {
        assert!(normalizer().validate_file("a.pdf", "application/pdf", 0).is_err());
    }

    // ==================== Item Construction ====================

    #[test]
    fn test_url_item_derives_name_from_host() {
        let item = normalizer().normalize(RawInput::url("example.com")).unwrap();
        assert_eq!(item.kind, ItemKind::Url);
        assert_eq!(item.name, "example_com");
        assert_eq!(item.url(), Some("https://example.com"));
        assert_eq!(item.status, ItemStatus::Pending);
    }

    #[test]
    fn test_url_item_keeps_supplied_name() {
        let item = normalizer()
            .normalize(RawInput::url("example.com").with_name("  Home page "))
            .unwrap();
        assert_eq!(item.name, "Home page");
    }

    #[test]
    fn test_file_item_keeps_file_name() {
        let item = normalizer()
            .normalize(RawInput::file("notes.pdf", "application/pdf", vec![1, 2, 3]))
            .unwrap();
        assert_eq!(item.kind, ItemKind::File);
        assert_eq!(item.name, "notes.pdf");
        assert!(matches!(item.payload, ItemPayload::File { ref bytes, .. } if bytes.len() == 3));
    }

    #[test]
    fn test_supplied_id_is_replaced() {
        let raw = RawInput::Url {
            url: "example.com".to_string(),
            name: None,
            id: Some("caller-id".to_string()),
            options: None,
        };
        let first = normalizer().normalize(raw.clone()).unwrap();
        let second = normalizer().normalize(raw).unwrap();
        assert_ne!(first.id, second.id);
        assert_ne!(first.id.to_string(), "caller-id");
    }

    #[test]
    fn test_parent_url_uses_configured_default_depth() {
        let n = Normalizer::new(NormalizerConfig {
            default_max_depth: Some(2),
            ..NormalizerConfig::default()
        });
        let item = n.normalize(RawInput::parent_url("example.com/docs")).unwrap();
        assert_eq!(item.kind, ItemKind::ParentUrl);
        assert_eq!(item.options.max_link_depth, Some(2));
        assert!(!item.options.follow_links);
    }

    #[test]
    fn test_parent_url_keeps_explicit_follow_links() {
        let raw = RawInput::parent_url("example.com/docs").with_options(ConversionOptions {
            follow_links: true,
            ..ConversionOptions::default()
        });
        let item = normalizer().normalize(raw).unwrap();
        assert!(item.options.follow_links);
        assert_eq!(item.options.max_link_depth, None);
    }

    #[test]
    fn test_single_page_items_drop_crawl_options() {
        let raw = RawInput::url("example.com").with_options(ConversionOptions {
            follow_links: true,
            max_link_depth: Some(5),
            include_images: false,
            ..ConversionOptions::default()
        });
        let item = normalizer().normalize(raw).unwrap();
        assert!(!item.options.follow_links);
        assert_eq!(item.options.max_link_depth, None);
        assert!(!item.options.include_images);
    }

    #[test]
    fn test_derive_name_from_host_sanitizes() {
        assert_eq!(derive_name_from_host("https://docs.rs-lang.org/x"), "docs_rs_lang_org");
    }
}
