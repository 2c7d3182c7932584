//! OpenAI provider using the Chat Completions API.
//!
//! Remote images are passed by URL; local files are inlined as a base64 data
//! URL in the user message content array.

use super::image::ImageInput;
use super::provider::{ensure_success, parse_json, request_failed, require, CaptionProvider};
use crate::error::ProviderError;
use crate::types::ImageLocator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "openai";
const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const SYSTEM_PROMPT: &str = "You write succinct, descriptive ALT attributes.";
const USER_PROMPT: &str =
    "Describe this image as concise ALT text (<= 125 characters), no emojis, no prefixes.";

/// OpenAI provider using Chat Completions API.
pub struct OpenAiProvider {
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        model: &str,
        timeout: Duration,
    ) -> Self {
        let model = if model.trim().is_empty() {
            "gpt-4o-mini"
        } else {
            model
        };
        Self {
            api_key,
            model: model.to_string(),
            client,
            endpoint: ENDPOINT.to_string(),
            timeout,
        }
    }

    fn build_request(&self, image_url: String) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            max_tokens: 80,
            temperature: 0.2,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: MessageContent::Parts(vec![
                        ChatContent::Text {
                            text: USER_PROMPT.to_string(),
                        },
                        ChatContent::ImageUrl {
                            image_url: ImageUrl { url: image_url },
                        },
                    ]),
                },
            ],
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ChatContent>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn extract_caption(resp: ChatResponse) -> Result<String, ProviderError> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(ProviderError::Empty { provider: NAME })
}

#[async_trait]
impl CaptionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_caption(&self, image: &ImageLocator) -> Result<String, ProviderError> {
        let api_key = require(&self.api_key, NAME, "api_key")?;

        let image_url = match image {
            ImageLocator::Url(url) => url.clone(),
            ImageLocator::Path(path) => ImageInput::load(path).await?.data_url(),
        };
        let body = self.build_request(image_url);

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(request_failed(NAME))?;

        let resp = ensure_success(NAME, resp).await?;
        let chat_resp: ChatResponse = parse_json(NAME, resp).await?;
        extract_caption(chat_resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn provider(api_key: Option<&str>) -> OpenAiProvider {
        OpenAiProvider::new(
            reqwest::Client::new(),
            api_key.map(String::from),
            "gpt-4o-mini",
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_request_shape() {
        let body = provider(Some("sk")).build_request("https://x/cat.jpg".into());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 80);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(json["messages"][1]["content"][0]["type"], "text");
        assert_eq!(json["messages"][1]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][1]["content"][1]["image_url"]["url"],
            "https://x/cat.jpg"
        );
    }

    #[test]
    fn test_empty_model_falls_back() {
        let p = OpenAiProvider::new(reqwest::Client::new(), None, " ", Duration::from_secs(1));
        assert_eq!(p.model, "gpt-4o-mini");
    }

    #[test]
    fn test_extract_caption_trims() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"  A cat asleep on a sofa. "}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_caption(resp).unwrap(), "A cat asleep on a sofa.");
    }

    #[test]
    fn test_extract_caption_empty_choices() {
        let resp: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_caption(resp),
            Err(ProviderError::Empty { .. })
        ));

        let resp: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(extract_caption(resp).is_err());
    }

    #[tokio::test]
    async fn test_missing_key_is_reported_before_any_io() {
        let err = provider(None)
            .try_caption(&ImageLocator::Path(PathBuf::from("/nonexistent.jpg")))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_local_file_fails_before_request() {
        let err = provider(Some("sk"))
            .try_caption(&ImageLocator::Path(PathBuf::from("/nonexistent.jpg")))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ImageRead { .. }));
    }
}
