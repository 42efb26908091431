//! Turning decoded service responses into [`ConversionResult`]s.

use std::io::{Cursor, Read};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use super::{Attachment, ConversionResult};
use crate::item::ConversionItem;
use crate::transport::{InlineImage, ResponseBody, TransportError};

/// Builds the result for one item from its response body.
///
/// - JSON: `content` is the note, inline `images` become attachments
/// - zip: the first top-level `.md` entry is the note, every other file an attachment
/// - other binary: one attachment named after the item
/// - text: the note itself
///
/// # Errors
///
/// Returns [`TransportError::Decode`] for undecodable images or archives.
pub fn single_result(
    item: &ConversionItem,
    url: &str,
    body: ResponseBody,
) -> Result<ConversionResult, TransportError> {
    match body {
        ResponseBody::Json(envelope) => Ok(ConversionResult {
            name: item.name.clone(),
            content_text: envelope.content.unwrap_or_default(),
            attachments: decode_images(url, &envelope.images)?,
        }),
        ResponseBody::Binary { bytes, .. } if is_zip(&bytes) => {
            let entries = read_zip_entries(url, &bytes)?;
            let note_index = entries
                .iter()
                .position(|(name, _)| is_top_level_note(name))
                .ok_or_else(|| TransportError::decode(url, "archive contains no markdown note"))?;
            let mut attachments = Vec::with_capacity(entries.len().saturating_sub(1));
            let mut content_text = String::new();
            for (index, (name, data)) in entries.into_iter().enumerate() {
                if index == note_index {
                    content_text = String::from_utf8_lossy(&data).into_owned();
                } else {
                    attachments.push(Attachment { name, bytes: data });
                }
            }
            Ok(ConversionResult {
                name: item.name.clone(),
                content_text,
                attachments,
            })
        }
        ResponseBody::Binary {
            content_type,
            bytes,
        } => {
            debug!(%content_type, len = bytes.len(), "binary response kept as attachment");
            Ok(ConversionResult {
                name: item.name.clone(),
                content_text: String::new(),
                attachments: vec![Attachment {
                    name: item.name.clone(),
                    bytes,
                }],
            })
        }
        ResponseBody::Text(text) => Ok(ConversionResult::text(item.name.clone(), text)),
    }
}

/// Builds per-member results from a batch response, in member order.
///
/// Accepts a JSON envelope with a `results` array or a zip holding one
/// top-level `.md` per member with its attachments under a folder of the same
/// stem.
///
/// # Errors
///
/// Returns [`TransportError::Api`] when the result count differs from the
/// member count, and [`TransportError::Decode`] for undecodable content.
pub fn batch_results(
    items: &[ConversionItem],
    url: &str,
    body: ResponseBody,
) -> Result<Vec<ConversionResult>, TransportError> {
    let (count, results) = match body {
        ResponseBody::Json(envelope) => {
            let count = envelope.results.len();
            let results = envelope
                .results
                .into_iter()
                .zip(items)
                .map(|(payload, item)| -> Result<ConversionResult, TransportError> {
                    Ok(ConversionResult {
                        name: item.name.clone(),
                        attachments: decode_images(url, &payload.images)?,
                        content_text: payload.content,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            (count, results)
        }
        ResponseBody::Binary { bytes, .. } if is_zip(&bytes) => {
            let notes = split_batch_archive(read_zip_entries(url, &bytes)?);
            let count = notes.len();
            let results = notes
                .into_iter()
                .zip(items)
                .map(|((content_text, attachments), item)| ConversionResult {
                    name: item.name.clone(),
                    content_text,
                    attachments,
                })
                .collect();
            (count, results)
        }
        ResponseBody::Binary { content_type, .. } => {
            return Err(TransportError::decode(
                url,
                format!("unexpected batch response type '{content_type}'"),
            ));
        }
        ResponseBody::Text(_) => {
            return Err(TransportError::decode(url, "unexpected text batch response"));
        }
    };

    if count != items.len() {
        return Err(TransportError::unsuccessful(
            url,
            200,
            format!("batch returned {count} results for {} items", items.len()),
            None,
        ));
    }
    Ok(results)
}

fn decode_images(url: &str, images: &[InlineImage]) -> Result<Vec<Attachment>, TransportError> {
    images
        .iter()
        .map(|image| {
            // Tolerate data URLs as well as bare base64.
            let data = match image.data.split_once(',') {
                Some((prefix, rest)) if prefix.starts_with("data:") => rest,
                _ => image.data.as_str(),
            };
            let bytes = STANDARD.decode(data.trim()).map_err(|e| {
                TransportError::decode(url, format!("image '{}' is not valid base64: {e}", image.name))
            })?;
            Ok(Attachment {
                name: image.name.clone(),
                bytes,
            })
        })
        .collect()
}

fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK")
}

fn is_top_level_note(name: &str) -> bool {
    !name.contains('/') && name.to_ascii_lowercase().ends_with(".md")
}

fn note_stem(name: &str) -> &str {
    name.rfind('.').map_or(name, |dot| &name[..dot])
}

/// Groups archive entries into `(note, attachments)` pairs in archive order.
fn split_batch_archive(entries: Vec<(String, Vec<u8>)>) -> Vec<(String, Vec<Attachment>)> {
    let (notes, files): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|(name, _)| is_top_level_note(name));

    let mut grouped: Vec<(String, String, Vec<Attachment>)> = notes
        .into_iter()
        .map(|(name, data)| {
            (
                note_stem(&name).to_string(),
                String::from_utf8_lossy(&data).into_owned(),
                Vec::new(),
            )
        })
        .collect();

    for (name, data) in files {
        let owner = name.split_once('/').and_then(|(folder, rest)| {
            grouped
                .iter()
                .position(|(stem, _, _)| stem == folder)
                .map(|index| (index, rest.to_string()))
        });
        match owner {
            Some((index, rest)) => grouped[index].2.push(Attachment {
                name: rest,
                bytes: data,
            }),
            None => warn!(entry = %name, "archive entry does not belong to any note, skipped"),
        }
    }

    grouped
        .into_iter()
        .map(|(_, content, attachments)| (content, attachments))
        .collect()
}

/// Reads every file entry of an archive, in archive order.
fn read_zip_entries(url: &str, bytes: &[u8]) -> Result<Vec<(String, Vec<u8>)>, TransportError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| TransportError::decode(url, format!("invalid zip archive: {e}")))?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|e| TransportError::decode(url, format!("failed to read zip entry: {e}")))?;
        if file.is_dir() {
            continue;
        }
        if file.enclosed_name().is_none() {
            warn!(entry = %file.name(), "unsafe archive path, skipped");
            continue;
        }
        let name = file.name().trim_start_matches("./").to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| TransportError::decode(url, format!("failed to read '{name}': {e}")))?;
        entries.push((name, data));
    }
    Ok(entries)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::item::{Normalizer, RawInput};
    use crate::transport::{ApiEnvelope, ResultPayload};

    const URL: &str = "https://api.test/convert/url";

    fn item(url: &str) -> ConversionItem {
        Normalizer::default().normalize(RawInput::url(url)).unwrap()
    }

    fn envelope() -> ApiEnvelope {
        serde_json::from_str(r#"{"success": true}"#).unwrap()
    }

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn zip_body(bytes: Vec<u8>) -> ResponseBody {
        ResponseBody::Binary {
            content_type: "application/zip".to_string(),
            bytes,
        }
    }

    #[test]
    fn test_json_content_and_images() {
        let mut env = envelope();
        env.content = Some("# Example".to_string());
        env.images = vec![InlineImage {
            name: "logo.png".to_string(),
            data: "data:image/png;base64,AAEC".to_string(),
        }];
        let result = single_result(&item("example.com"), URL, ResponseBody::Json(env)).unwrap();
        assert_eq!(result.name, "example_com");
        assert_eq!(result.content_text, "# Example");
        assert_eq!(result.attachments[0].bytes, vec![0, 1, 2]);
    }

    #[test]
    fn test_invalid_image_is_decode_error() {
        let mut env = envelope();
        env.images = vec![InlineImage {
            name: "x.png".to_string(),
            data: "!!!".to_string(),
        }];
        let err = single_result(&item("example.com"), URL, ResponseBody::Json(env)).unwrap_err();
        assert_eq!(err.code(), "DECODE_ERROR");
    }

    #[test]
    fn test_zip_note_and_attachments() {
        let bytes = zip_of(&[
            ("images/fig.png", b"png"),
            ("page.md", b"# Page"),
            ("child.md", b"# Child"),
        ]);
        let result = single_result(&item("example.com"), URL, zip_body(bytes)).unwrap();
        assert_eq!(result.content_text, "# Page");
        let names: Vec<_> = result.attachments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["images/fig.png", "child.md"]);
    }

    #[test]
    fn test_zip_without_note_is_decode_error() {
        let bytes = zip_of(&[("images/fig.png", b"png")]);
        let err = single_result(&item("example.com"), URL, zip_body(bytes)).unwrap_err();
        assert!(err.to_string().contains("no markdown note"));
    }

    #[test]
    fn test_opaque_binary_is_single_attachment() {
        let body = ResponseBody::Binary {
            content_type: "application/octet-stream".to_string(),
            bytes: vec![9, 9],
        };
        let result = single_result(&item("example.com"), URL, body).unwrap();
        assert!(result.content_text.is_empty());
        assert_eq!(result.attachments.len(), 1);
    }

    #[test]
    fn test_text_body_is_note() {
        let result =
            single_result(&item("example.com"), URL, ResponseBody::Text("hello".into())).unwrap();
        assert_eq!(result.content_text, "hello");
    }

    #[test]
    fn test_batch_json_results_in_member_order() {
        let items = vec![item("example.com"), item("example.org")];
        let mut env = envelope();
        env.results = vec![
            ResultPayload {
                name: None,
                content: "A".to_string(),
                images: Vec::new(),
            },
            ResultPayload {
                name: None,
                content: "B".to_string(),
                images: Vec::new(),
            },
        ];
        let results = batch_results(&items, URL, ResponseBody::Json(env)).unwrap();
        assert_eq!(results[0].name, "example_com");
        assert_eq!(results[1].content_text, "B");
    }

    #[test]
    fn test_batch_count_mismatch_is_api_error() {
        let items = vec![item("example.com"), item("example.org")];
        let mut env = envelope();
        env.results = vec![ResultPayload {
            name: None,
            content: "A".to_string(),
            images: Vec::new(),
        }];
        let err = batch_results(&items, URL, ResponseBody::Json(env)).unwrap_err();
        assert_eq!(err.code(), "API_ERROR");
        assert!(err.to_string().contains("1 results for 2 items"));
    }

    #[test]
    fn test_batch_zip_groups_attachments_by_stem() {
        let items = vec![item("example.com"), item("example.org")];
        let bytes = zip_of(&[
            ("a.md", b"# A"),
            ("a/fig.png", b"1"),
            ("b.md", b"# B"),
            ("b/img/x.png", b"2"),
            ("stray/file.bin", b"3"),
        ]);
        let results = batch_results(&items, URL, zip_body(bytes)).unwrap();
        assert_eq!(results[0].content_text, "# A");
        assert_eq!(results[0].attachments[0].name, "fig.png");
        assert_eq!(results[1].attachments[0].name, "img/x.png");
    }

    #[test]
    fn test_batch_text_is_decode_error() {
        let items = vec![item("example.com")];
        let err = batch_results(&items, URL, ResponseBody::Text("x".into())).unwrap_err();
        assert_eq!(err.code(), "DECODE_ERROR");
    }
}
