//! Azure Computer Vision provider (`describe`).
//!
//! Authenticates with a subscription-key header. Remote images are sent by
//! URL; local files are posted as raw `application/octet-stream` bytes.

use super::image::read_bytes;
use super::labels::{truncate_chars, MAX_CAPTION_CHARS};
use super::provider::{ensure_success, parse_json, request_failed, require, CaptionProvider};
use crate::error::ProviderError;
use crate::types::ImageLocator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "azure";

/// Azure Vision v3.2 describe provider.
pub struct AzureVisionProvider {
    endpoint: Option<String>,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl AzureVisionProvider {
    pub fn new(
        client: reqwest::Client,
        endpoint: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint,
            api_key,
            client,
            timeout,
        }
    }
}

/// `<endpoint>/vision/v3.2/describe`, tolerating a trailing slash.
fn describe_url(endpoint: &str) -> String {
    format!("{}/vision/v3.2/describe", endpoint.trim_end_matches('/'))
}

#[derive(Serialize)]
struct UrlBody<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct DescribeResponse {
    description: Option<Description>,
}

#[derive(Deserialize)]
struct Description {
    #[serde(default)]
    captions: Vec<Caption>,
}

#[derive(Deserialize)]
struct Caption {
    text: String,
}

fn extract_caption(resp: DescribeResponse) -> Result<String, ProviderError> {
    let text = resp
        .description
        .and_then(|d| d.captions.into_iter().next())
        .map(|c| c.text)
        .unwrap_or_default();

    let caption = truncate_chars(text.trim_matches(|c| c == ' ' || c == '.'), MAX_CAPTION_CHARS);
    if caption.is_empty() {
        return Err(ProviderError::Empty { provider: NAME });
    }
    Ok(caption.to_string())
}

#[async_trait]
impl CaptionProvider for AzureVisionProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_caption(&self, image: &ImageLocator) -> Result<String, ProviderError> {
        let endpoint = require(&self.endpoint, NAME, "endpoint")?;
        let api_key = require(&self.api_key, NAME, "api_key")?;

        let request = self
            .client
            .post(describe_url(endpoint))
            .header("Ocp-Apim-Subscription-Key", api_key)
            .query(&[("maxCandidates", "1"), ("language", "en")])
            .timeout(self.timeout);

        let request = match image {
            ImageLocator::Url(url) => request.json(&UrlBody { url }),
            ImageLocator::Path(_) => {
                let bytes = read_bytes(&self.client, image).await?;
                request
                    .header("Content-Type", "application/octet-stream")
                    .body(bytes)
            }
        };

        let resp = request.send().await.map_err(request_failed(NAME))?;
        let resp = ensure_success(NAME, resp).await?;
        let describe: DescribeResponse = parse_json(NAME, resp).await?;
        extract_caption(describe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_url() {
        assert_eq!(
            describe_url("https://vision.cognitiveservices.azure.com/"),
            "https://vision.cognitiveservices.azure.com/vision/v3.2/describe"
        );
        assert_eq!(
            describe_url("https://vision.cognitiveservices.azure.com"),
            "https://vision.cognitiveservices.azure.com/vision/v3.2/describe"
        );
    }

    #[test]
    fn test_caption_is_trimmed_of_dots() {
        let resp: DescribeResponse = serde_json::from_str(
            r#"{"description":{"tags":["cat"],"captions":[
                {"text":"a cat lying on a couch.","confidence":0.91}
            ]},"requestId":"x"}"#,
        )
        .unwrap();
        assert_eq!(extract_caption(resp).unwrap(), "a cat lying on a couch");
    }

    #[test]
    fn test_caption_is_truncated() {
        let long = "b".repeat(300);
        let resp: DescribeResponse = serde_json::from_str(&format!(
            r#"{{"description":{{"captions":[{{"text":"{long}"}}]}}}}"#
        ))
        .unwrap();
        assert_eq!(extract_caption(resp).unwrap().chars().count(), 180);
    }

    #[test]
    fn test_missing_caption_is_empty() {
        let resp: DescribeResponse =
            serde_json::from_str(r#"{"description":{"captions":[]}}"#).unwrap();
        assert!(extract_caption(resp).is_err());
        let resp: DescribeResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(extract_caption(resp).is_err());
    }
}
