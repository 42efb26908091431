//! Media type allow-list and extension-based detection.

use std::path::Path;

/// Office document type accepted alongside the generic families.
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Exact media types accepted for upload.
const ALLOWED_EXACT: &[&str] = &["application/pdf", "text/plain", "text/html", DOCX_MEDIA_TYPE];

/// Media type families accepted for upload (`image/*`, ...).
const ALLOWED_FAMILIES: &[&str] = &["image/", "audio/", "video/"];

/// Returns true if the declared media type may be sent for conversion.
///
/// Parameters such as `; charset=utf-8` are ignored and comparison is
/// case-insensitive.
#[must_use]
pub fn is_allowed_media_type(media_type: &str) -> bool {
    let essence = essence(media_type);
    if essence.is_empty() {
        return false;
    }
    ALLOWED_EXACT.contains(&essence.as_str())
        || ALLOWED_FAMILIES
            .iter()
            .any(|family| essence.starts_with(family) && essence.len() > family.len())
}

/// Infers a media type from a file name's extension.
///
/// Returns `application/octet-stream` for unknown extensions, which the
/// allow-list then rejects.
#[must_use]
pub fn media_type_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" | "text" => "text/plain",
        "md" | "markdown" => "text/plain",
        "html" | "htm" => "text/html",
        "docx" => DOCX_MEDIA_TYPE,
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
