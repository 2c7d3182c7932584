//! Google Cloud Vision provider (label detection).
//!
//! Authenticates with an API key query parameter. Remote images are passed
//! as `imageUri`, local files inline as base64 `content`.

use super::image::ImageInput;
use super::labels::labels_to_alt;
use super::provider::{ensure_success, parse_json, request_failed, require, CaptionProvider};
use crate::error::ProviderError;
use crate::types::ImageLocator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "google";
const ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Google Vision `LABEL_DETECTION` provider.
pub struct GoogleVisionProvider {
    api_key: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl GoogleVisionProvider {
    pub fn new(client: reqwest::Client, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            api_key,
            client,
            timeout,
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Serialize)]
struct ImageRequest {
    image: VisionImage,
    features: Vec<Feature>,
}

#[derive(Serialize, Default)]
struct VisionImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<ImageSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageSource {
    image_uri: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

fn build_request(image: VisionImage) -> AnnotateRequest {
    AnnotateRequest {
        requests: vec![ImageRequest {
            image,
            features: vec![Feature {
                kind: "LABEL_DETECTION",
                max_results: 5,
            }],
        }],
    }
}

// --- Response types ---

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    label_annotations: Vec<LabelAnnotation>,
    error: Option<Status>,
}

#[derive(Deserialize)]
struct LabelAnnotation {
    description: String,
}

#[derive(Deserialize)]
struct Status {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

fn extract_caption(resp: AnnotateResponse) -> Result<String, ProviderError> {
    let first = resp
        .responses
        .into_iter()
        .next()
        .ok_or(ProviderError::Empty { provider: NAME })?;

    // Per-image failures come back inside a 200 response.
    if let Some(status) = first.error {
        return Err(ProviderError::Http {
            provider: NAME,
            status: status.code,
            body: status.message,
        });
    }

    let labels: Vec<String> = first
        .label_annotations
        .into_iter()
        .map(|l| l.description)
        .collect();
    labels_to_alt(&labels).ok_or(ProviderError::Empty { provider: NAME })
}

#[async_trait]
impl CaptionProvider for GoogleVisionProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_caption(&self, image: &ImageLocator) -> Result<String, ProviderError> {
        let api_key = require(&self.api_key, NAME, "api_key")?;

        let vision_image = match image {
            ImageLocator::Url(url) => VisionImage {
                source: Some(ImageSource {
                    image_uri: url.clone(),
                }),
                ..Default::default()
            },
            ImageLocator::Path(path) => VisionImage {
                content: Some(ImageInput::load(path).await?.data),
                ..Default::default()
            },
        };

        let resp = self
            .client
            .post(ENDPOINT)
            .query(&[("key", api_key)])
            .json(&build_request(vision_image))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(request_failed(NAME))?;

        let resp = ensure_success(NAME, resp).await?;
        let annotate: AnnotateResponse = parse_json(NAME, resp).await?;
        extract_caption(annotate)
    }
}
