//! [`ConversionBackend`] over the remote conversion service.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};
use tracing::{info, instrument};

use super::decode::{batch_results, single_result};
use super::{ConversionBackend, ConversionResult};
use crate::credentials::ApiKey;
use crate::error::ConversionError;
use crate::item::{ConversionItem, ConversionOptions, ItemKind, ItemPayload};
use crate::transport::{ApiClient, Endpoint, MultipartField, RequestSpec};

/// Converts items by calling the conversion service.
#[derive(Debug, Clone)]
pub struct ApiBackend {
    client: ApiClient,
}

impl ApiBackend {
    /// Wraps a configured client.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl ConversionBackend for ApiBackend {
    #[instrument(skip(self, item, api_key), fields(id = %item.id, kind = %item.kind, name = %item.name))]
    async fn convert_item(
        &self,
        item: &ConversionItem,
        api_key: &ApiKey,
    ) -> Result<ConversionResult, ConversionError> {
        let (endpoint, spec) = item_request(item);
        let spec = spec.with_api_key(Some(api_key));
        let body = self.client.send(endpoint, &spec).await?;
        let url = self.client.endpoints().url(endpoint);
        let result = single_result(item, &url, body)?;
        info!(
            attachments = result.attachments.len(),
            chars = result.content_text.len(),
            "item converted"
        );
        Ok(result)
    }

    #[instrument(skip(self, items, api_key), fields(count = items.len()))]
    async fn convert_batch(
        &self,
        items: &[ConversionItem],
        api_key: &ApiKey,
    ) -> Result<Vec<ConversionResult>, ConversionError> {
        let spec = RequestSpec::json(batch_body(items)).with_api_key(Some(api_key));
        let body = self.client.send(Endpoint::ConvertBatch, &spec).await?;
        let url = self.client.endpoints().url(Endpoint::ConvertBatch);
        let results = batch_results(items, &url, body)?;
        info!(results = results.len(), "batch converted");
        Ok(results)
    }
}

fn options_json(kind: ItemKind, options: &ConversionOptions) -> Value {
    let mut map = Map::new();
    map.insert("includeImages".into(), Value::Bool(options.include_images));
    map.insert("includeMeta".into(), Value::Bool(options.include_metadata));
    if kind == ItemKind::ParentUrl {
        map.insert("followLinks".into(), Value::Bool(options.follow_links));
        if let Some(depth) = options.max_link_depth {
            map.insert("maxDepth".into(), Value::from(depth));
        }
    }
    Value::Object(map)
}

/// Chooses the endpoint and request body for a single item.
fn item_request(item: &ConversionItem) -> (Endpoint, RequestSpec) {
    match (&item.payload, item.kind) {
        (
            ItemPayload::File {
                file_name,
                media_type,
                bytes,
            },
            _,
        ) => (
            Endpoint::ConvertFile,
            RequestSpec::multipart(vec![
                MultipartField::File {
                    name: "file".to_string(),
                    file_name: file_name.clone(),
                    media_type: media_type.clone(),
                    bytes: bytes.clone(),
                },
                MultipartField::Text {
                    name: "fileType".to_string(),
                    value: media_type.clone(),
                },
            ]),
        ),
        (ItemPayload::Url(url), kind) => {
            let endpoint = match kind {
                ItemKind::ParentUrl => Endpoint::ConvertParentUrl,
                ItemKind::Video => Endpoint::ConvertYoutube,
                ItemKind::Url | ItemKind::File | ItemKind::BatchMember => Endpoint::ConvertUrl,
            };
            (
                endpoint,
                RequestSpec::json(json!({
                    "url": url,
                    "name": item.name,
                    "options": options_json(kind, &item.options),
                })),
            )
        }
    }
}

fn batch_type(item: &ConversionItem) -> &'static str {
    match (&item.payload, item.kind) {
        (ItemPayload::File { .. }, _) => "file",
        (ItemPayload::Url(_), ItemKind::ParentUrl) => "parent",
        (ItemPayload::Url(_), ItemKind::Video) => "youtube",
        (ItemPayload::Url(_), _) => "url",
    }
}

/// Builds `{items: [...]}` for the batch endpoint.
fn batch_body(items: &[ConversionItem]) -> Value {
    let members: Vec<Value> = items
        .iter()
        .map(|item| {
            let mut member = json!({
                "type": batch_type(item),
                "name": item.name,
                "options": options_json(item.kind, &item.options),
            });
            if let Value::Object(map) = &mut member {
                match &item.payload {
                    ItemPayload::Url(url) => {
                        map.insert("url".into(), Value::String(url.clone()));
                    }
                    ItemPayload::File {
                        media_type, bytes, ..
                    } => {
                        map.insert("content".into(), Value::String(STANDARD.encode(bytes)));
                        map.insert("fileType".into(), Value::String(media_type.clone()));
                    }
                }
            }
            member
        })
        .collect();
    json!({ "items": members })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::item::{Normalizer, RawInput};
    use crate::transport::RequestBody;

    fn normalize(raw: RawInput) -> ConversionItem {
        Normalizer::default().normalize(raw).unwrap()
    }

    #[test]
    fn test_url_request() {
        let item = normalize(RawInput::url("example.com/a"));
        let (endpoint, spec) = item_request(&item);
        assert_eq!(endpoint, Endpoint::ConvertUrl);
        let RequestBody::Json(body) = spec.body else {
            panic!("expected JSON body");
        };
        assert_eq!(body["url"], "https://example.com/a");
        assert_eq!(body["options"]["includeImages"], true);
        assert!(body["options"].get("maxDepth").is_none());
    }

    #[test]
    fn test_parent_url_request_carries_depth() {
        let options = ConversionOptions {
            follow_links: true,
            max_link_depth: Some(2),
            ..ConversionOptions::default()
        };
        let item = normalize(RawInput::parent_url("docs.example.com").with_options(options));
        let (endpoint, spec) = item_request(&item);
        assert_eq!(endpoint, Endpoint::ConvertParentUrl);
        let RequestBody::Json(body) = spec.body else {
            panic!("expected JSON body");
        };
        assert_eq!(body["options"]["maxDepth"], 2);
        assert_eq!(body["options"]["followLinks"], true);
    }

    #[test]
    fn test_parent_url_does_not_follow_links_by_default() {
        let item = normalize(RawInput::parent_url("docs.example.com"));
        let (_, spec) = item_request(&item);
        let RequestBody::Json(body) = spec.body else {
            panic!("expected JSON body");
        };
        assert_eq!(body["options"]["followLinks"], false);
        assert!(body["options"].get("maxDepth").is_none());
    }

    #[test]
    fn test_video_goes_to_youtube_endpoint() {
        let item = normalize(RawInput::video("https://www.youtube.com/watch?v=abc"));
        let (endpoint, _) = item_request(&item);
        assert_eq!(endpoint, Endpoint::ConvertYoutube);
    }

    #[test]
    fn test_file_request_is_multipart() {
        let item = normalize(RawInput::file("notes.pdf", "application/pdf", vec![1, 2, 3]));
        let (endpoint, spec) = item_request(&item);
        assert_eq!(endpoint, Endpoint::ConvertFile);
        let RequestBody::Multipart(fields) = spec.body else {
            panic!("expected multipart body");
        };
        assert_eq!(fields.len(), 2);
        assert!(matches!(&fields[1], MultipartField::Text { name, value } if name == "fileType" && value == "application/pdf"));
    }

    #[test]
    fn test_batch_body_types() {
        let items = vec![
            normalize(RawInput::url("example.com")),
            normalize(RawInput::parent_url("example.org")),
            normalize(RawInput::file("a.txt", "text/plain", b"hi".to_vec())),
        ];
        let body = batch_body(&items);
        let members = body["items"].as_array().unwrap();
        assert_eq!(members[0]["type"], "url");
        assert_eq!(members[1]["type"], "parent");
        assert_eq!(members[2]["type"], "file");
        assert_eq!(members[2]["content"], "aGk=");
        assert_eq!(members[2]["fileType"], "text/plain");
    }
}
