//! AWS Rekognition provider (`DetectLabels`).
//!
//! Rekognition only accepts S3 objects or inline bytes, so remote images are
//! downloaded first. Requests are signed with SigV4 over the JSON-RPC POST.

use super::image::read_bytes;
use super::labels::labels_to_alt;
use super::provider::{ensure_success, parse_json, request_failed, require, CaptionProvider};
use super::sigv4::{sign_json_rpc, SigningParams, JSON_CONTENT_TYPE};
use crate::error::ProviderError;
use crate::types::ImageLocator;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "aws";
const SERVICE: &str = "rekognition";
const TARGET: &str = "RekognitionService.DetectLabels";
const DEFAULT_REGION: &str = "us-east-1";

/// AWS Rekognition label-detection provider.
pub struct RekognitionProvider {
    access_key: Option<String>,
    secret_key: Option<String>,
    region: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RekognitionProvider {
    pub fn new(
        client: reqwest::Client,
        access_key: Option<String>,
        secret_key: Option<String>,
        region: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            access_key,
            secret_key,
            region: region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
            client,
            timeout,
        }
    }

    fn host(&self) -> String {
        format!("{SERVICE}.{}.amazonaws.com", self.region)
    }
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsRequest {
    image: RekognitionImage,
    max_labels: u32,
    min_confidence: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RekognitionImage {
    /// Base64-encoded image bytes (blob encoding of the JSON protocol)
    bytes: String,
}

fn build_payload(image_bytes: &[u8]) -> Result<Vec<u8>, ProviderError> {
    let request = DetectLabelsRequest {
        image: RekognitionImage {
            bytes: base64::engine::general_purpose::STANDARD.encode(image_bytes),
        },
        max_labels: 5,
        min_confidence: 70,
    };
    serde_json::to_vec(&request).map_err(|e| ProviderError::Parse {
        provider: NAME,
        message: e.to_string(),
    })
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsResponse {
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Label {
    name: String,
}

fn extract_caption(resp: DetectLabelsResponse) -> Result<String, ProviderError> {
    let names: Vec<String> = resp.labels.into_iter().map(|l| l.name).collect();
    labels_to_alt(&names).ok_or(ProviderError::Empty { provider: NAME })
}

#[async_trait]
impl CaptionProvider for RekognitionProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_caption(&self, image: &ImageLocator) -> Result<String, ProviderError> {
        let access_key = require(&self.access_key, NAME, "access_key")?;
        let secret_key = require(&self.secret_key, NAME, "secret_key")?;

        let image_bytes = read_bytes(&self.client, image).await?;
        let payload = build_payload(&image_bytes)?;

        let host = self.host();
        let signed = sign_json_rpc(
            &SigningParams {
                access_key,
                secret_key,
                region: &self.region,
                service: SERVICE,
            },
            &host,
            TARGET,
            &payload,
            chrono::Utc::now(),
        );

        tracing::debug!(region = %self.region, bytes = image_bytes.len(), "Rekognition DetectLabels");

        let resp = self
            .client
            .post(format!("https://{host}/"))
            .header("Content-Type", JSON_CONTENT_TYPE)
            .header("X-Amz-Date", &signed.amz_date)
            .header("X-Amz-Target", TARGET)
            .header("Authorization", &signed.authorization)
            .body(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(request_failed(NAME))?;

        let resp = ensure_success(NAME, resp).await?;
        let labels: DetectLabelsResponse = parse_json(NAME, resp).await?;
        extract_caption(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn provider(region: Option<&str>) -> RekognitionProvider {
        RekognitionProvider::new(
            reqwest::Client::new(),
            Some("AKIDEXAMPLE".into()),
            Some("secret".into()),
            region.map(String::from),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn test_payload_shape() {
        let payload = build_payload(b"hello").unwrap();
        assert_eq!(
            String::from_utf8(payload).unwrap(),
            r#"{"Image":{"Bytes":"aGVsbG8="},"MaxLabels":5,"MinConfidence":70}"#
        );
    }

    #[test]
    fn test_region_defaults_to_us_east_1() {
        assert_eq!(provider(None).host(), "rekognition.us-east-1.amazonaws.com");
        assert_eq!(
            provider(Some("eu-west-1")).host(),
            "rekognition.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_labels_become_phrase() {
        let resp: DetectLabelsResponse = serde_json::from_str(
            r#"{"Labels":[
                {"Name":"Cat","Confidence":99.1},
                {"Name":"Cat","Confidence":98.0},
                {"Name":"Sofa","Confidence":90.2},
                {"Name":"Window","Confidence":80.0},
                {"Name":"Lamp","Confidence":75.5}
            ],"LabelModelVersion":"3.0"}"#,
        )
        .unwrap();
        assert_eq!(extract_caption(resp).unwrap(), "Cat, Cat, Sofa");
    }

    #[test]
    fn test_no_labels_is_empty() {
        let resp: DetectLabelsResponse = serde_json::from_str(r#"{"Labels":[]}"#).unwrap();
        assert!(extract_caption(resp).is_err());
    }

    #[tokio::test]
    async fn test_missing_secret_is_reported() {
        let p = RekognitionProvider::new(
            reqwest::Client::new(),
            Some("AKIDEXAMPLE".into()),
            None,
            None,
            Duration::from_secs(30),
        );
        let err = p
            .try_caption(&ImageLocator::Path(PathBuf::from("/nonexistent.jpg")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "aws: missing credential secret_key");
    }
}
