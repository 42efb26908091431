//! Result packager: bundles converted notes into one zip archive.
//!
//! Layout:
//!
//! ```text
//! notes.md
//! notes/figure1.png
//! example_com.md
//! example_com/logo.png
//! ```
//!
//! Each result becomes `<stem>.md` with its attachments under `<stem>/`.
//! Repeated note names get `_2`, `_3`, ... suffixes.

mod error;

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;

use tracing::{debug, instrument};
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::convert::ConversionResult;

pub use error::PackagingError;

/// Deflate level used for every entry.
pub const COMPRESSION_LEVEL: i32 = 6;

/// Default archive file name used by front ends.
pub const DEFAULT_ARCHIVE_NAME: &str = "converted_notes.zip";

/// Builds the archive in memory.
///
/// # Errors
///
/// Returns [`PackagingError::NoItems`] for an empty slice, or an archive
/// error when writing an entry fails.
#[instrument(skip(results), fields(results = results.len()))]
pub fn pack(results: &[ConversionResult]) -> Result<Vec<u8>, PackagingError> {
    if results.is_empty() {
        return Err(PackagingError::NoItems);
    }

    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let mut used_stems = HashSet::new();

    for result in results {
        let stem = unique_stem(&note_stem(&result.name), &mut used_stems);
        let note_name = format!("{stem}.md");
        writer
            .start_file(note_name.as_str(), options)
            .map_err(|e| PackagingError::archive(&note_name, e))?;
        writer.write_all(result.content_text.as_bytes())?;

        for attachment in &result.attachments {
            let entry = format!("{stem}/{}", attachment_path(&attachment.name));
            writer
                .start_file(entry.as_str(), options)
                .map_err(|e| PackagingError::archive(&entry, e))?;
            writer.write_all(&attachment.bytes)?;
        }
        debug!(note = %note_name, attachments = result.attachments.len(), "packed note");
    }

    let cursor = writer
        .finish()
        .map_err(|e| PackagingError::archive("<central directory>", e))?;
    Ok(cursor.into_inner())
}

/// [`pack`] on the blocking thread pool.
///
/// # Errors
///
/// Same as [`pack`], plus [`PackagingError::TaskFailed`] when the blocking
/// task does not complete.
pub async fn pack_async(results: Vec<ConversionResult>) -> Result<Vec<u8>, PackagingError> {
    tokio::task::spawn_blocking(move || pack(&results))
        .await
        .map_err(|e| PackagingError::TaskFailed(e.to_string()))?
}

/// `notes.pdf` -> `notes`, `a/b.txt` -> `a_b`, `example_com` -> `example_com`.
fn note_stem(name: &str) -> String {
    let flattened = name.trim().replace(['/', '\\'], "_");
    let stem = Path::new(&flattened)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem.is_empty() {
        "note".to_string()
    } else {
        stem
    }
}

fn unique_stem(stem: &str, used: &mut HashSet<String>) -> String {
    if used.insert(stem.to_string()) {
        return stem.to_string();
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{stem}_{suffix}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Keeps relative sub-folders but drops `..`, `.` and empty segments.
fn attachment_path(name: &str) -> String {
    let cleaned: Vec<&str> = name
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect();
    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned.join("/")
    }
}
