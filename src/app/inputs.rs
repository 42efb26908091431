//! Turns `convert` arguments into raw inputs for the working set.

use std::path::Path;

use anyhow::{Context, Result};
use note_converter_core::item::media_type_from_path;
use note_converter_core::{ConversionOptions, ConverterConfig, RawInput, ValidationError};
use tracing::debug;

use crate::cli::{ConvertArgs, InputRef};

/// Reads every `--file` and collects all inputs in command-line order.
pub(crate) async fn collect_inputs(
    args: &ConvertArgs,
    config: &ConverterConfig,
) -> Result<Vec<RawInput>> {
    let max_file_size = config.normalizer_config().max_file_size;
    let mut inputs = Vec::with_capacity(args.input_count());

    for input in args.ordered_inputs() {
        let (raw, parent) = match input {
            InputRef::File(path) => (read_file_input(path, max_file_size).await?, false),
            InputRef::Url(url) => (RawInput::url(url), false),
            InputRef::ParentUrl(url) => (RawInput::parent_url(url), true),
            InputRef::Video(url) => (RawInput::video(url), false),
        };
        inputs.push(with_overrides(raw, item_options(args, config, parent)));
    }

    Ok(inputs)
}

/// Reads a file after checking its size on disk against `max_file_size`.
async fn read_file_input(path: &Path, max_file_size: u64) -> Result<RawInput> {
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let size = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?
        .len();
    if size > max_file_size {
        return Err(ValidationError::FileTooLarge {
            name,
            size,
            max: max_file_size,
        }
        .into());
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let media_type = media_type_from_path(path);
    debug!(path = %path.display(), media_type, size = bytes.len(), "read input file");
    Ok(RawInput::file(name, media_type, bytes))
}

fn with_overrides(raw: RawInput, options: Option<ConversionOptions>) -> RawInput {
    match options {
        Some(options) => raw.with_options(options),
        None => raw,
    }
}

/// Explicit options when any option flag was given; `None` keeps the
/// normalizer defaults for the item kind.
fn item_options(
    args: &ConvertArgs,
    config: &ConverterConfig,
    parent: bool,
) -> Option<ConversionOptions> {
    let overridden = args.no_images || args.no_metadata || (parent && args.max_depth.is_some());
    if !overridden {
        return None;
    }
    Some(ConversionOptions {
        include_images: !args.no_images,
        include_metadata: !args.no_metadata,
        follow_links: false,
        max_link_depth: if parent {
            args.max_depth.or(config.default_max_depth)
        } else {
            None
        },
    })
}
