//! Caption provider trait and the factory that selects one from config.
//!
//! Defines the interface that all vendor providers implement. Providers are
//! infallible from the caller's point of view: every failure is logged and
//! turned into an absent caption.

use crate::config::{Config, Credentials, ProviderKind};
use crate::error::ProviderError;
use crate::types::ImageLocator;
use async_trait::async_trait;
use std::time::Duration;

/// Trait that all caption providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn CaptionProvider>` for dynamic dispatch).
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Provider name for logging (e.g., "openai", "aws").
    fn name(&self) -> &'static str;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;

    /// One vendor round-trip. Errors stay inside the provider boundary.
    async fn try_caption(&self, image: &ImageLocator) -> Result<String, ProviderError>;

    /// Generate a caption, or `None` on any failure.
    ///
    /// An absent locator short-circuits without a network call.
    async fn generate_caption(&self, image: Option<&ImageLocator>) -> Option<String> {
        let image = image?;
        let timeout = self.timeout();

        let result = match tokio::time::timeout(timeout, self.try_caption(image)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider: self.name(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(caption) => Some(caption),
            Err(e) => {
                tracing::error!(provider = self.name(), image = %image, "{e}");
                None
            }
        }
    }
}

/// Factory that creates the configured provider.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the provider selected in `config`, resolving credentials from
    /// the config file and the process environment.
    pub fn create(config: &Config) -> Box<dyn CaptionProvider> {
        Self::create_with(config, config.credentials())
    }

    /// Create the selected provider with already-resolved credentials.
    ///
    /// Missing credentials are not an error here; the provider reports them
    /// per call and yields no caption.
    pub fn create_with(config: &Config, creds: Credentials) -> Box<dyn CaptionProvider> {
        let client = reqwest::Client::new();
        let vision_timeout = Duration::from_millis(config.limits.vision_timeout_ms);

        match config.generation.provider {
            ProviderKind::Openai => Box::new(super::openai::OpenAiProvider::new(
                client,
                creds.openai_api_key,
                &config.providers.openai.model,
                Duration::from_millis(config.limits.llm_timeout_ms),
            )),
            ProviderKind::Google => Box::new(super::google::GoogleVisionProvider::new(
                client,
                creds.google_api_key,
                vision_timeout,
            )),
            ProviderKind::Aws => Box::new(super::aws::RekognitionProvider::new(
                client,
                creds.aws_access_key,
                creds.aws_secret_key,
                creds.aws_region,
                vision_timeout,
            )),
            ProviderKind::Azure => Box::new(super::azure::AzureVisionProvider::new(
                client,
                creds.azure_endpoint,
                creds.azure_api_key,
                vision_timeout,
            )),
        }
    }
}

/// Unwrap a credential or report which one is missing.
pub(crate) fn require<'a>(
    value: &'a Option<String>,
    provider: &'static str,
    name: &'static str,
) -> Result<&'a str, ProviderError> {
    value
        .as_deref()
        .ok_or(ProviderError::MissingCredential { provider, name })
}

/// Map a transport error for `provider`.
pub(crate) fn request_failed(provider: &'static str) -> impl Fn(reqwest::Error) -> ProviderError {
    move |e| ProviderError::Request {
        provider,
        message: e.to_string(),
    }
}

/// Turn a non-2xx response into `ProviderError::Http`.
pub(crate) async fn ensure_success(
    provider: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::Http {
        provider,
        status: status.as_u16(),
        body,
    })
}

/// Decode a JSON body for `provider`.
pub(crate) async fn parse_json<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    resp: reqwest::Response,
) -> Result<T, ProviderError> {
    resp.json().await.map_err(|e| ProviderError::Parse {
        provider,
        message: e.to_string(),
    })
}
