//! Sub-configuration structs with their defaults.

use crate::types::TargetField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Selected caption provider.
///
/// Unknown or empty values fall back to OpenAI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum ProviderKind {
    #[default]
    Openai,
    Google,
    Aws,
    Azure,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Openai => "openai",
            ProviderKind::Google => "google",
            ProviderKind::Aws => "aws",
            ProviderKind::Azure => "azure",
        }
    }
}

impl From<&str> for ProviderKind {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" => ProviderKind::Google,
            "aws" => ProviderKind::Aws,
            "azure" => ProviderKind::Azure,
            "openai" | "" => ProviderKind::Openai,
            other => {
                tracing::warn!("Unknown provider '{other}', falling back to openai");
                ProviderKind::Openai
            }
        }
    }
}

impl From<String> for ProviderKind {
    fn from(value: String) -> Self {
        ProviderKind::from(value.as_str())
    }
}

impl From<ProviderKind> for String {
    fn from(value: ProviderKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Which provider generates captions
    pub provider: ProviderKind,

    /// Attribute that receives the caption ("alt", "title" or a field handle)
    pub target_field: TargetField,

    /// Replace captions that are already present
    pub overwrite_existing: bool,

    /// Captions are truncated to this many characters
    pub max_length: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Openai,
            target_field: TargetField::AltText,
            overwrite_existing: false,
            max_length: 180,
        }
    }
}

/// Per-provider credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: OpenAiConfig,
    pub google: GoogleConfig,
    pub aws: AwsConfig,
    pub azure: AzureConfig,
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: Option<String>,

    /// Model name
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Google Cloud Vision configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GoogleConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: Option<String>,
}

/// AWS Rekognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AwsConfig {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
}

/// Azure Computer Vision configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://my-vision.cognitiveservices.azure.com`
    pub endpoint: Option<String>,

    pub api_key: Option<String>,
}

/// Batch dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Asset ids per queued job
    pub chunk_size: usize,

    /// Jobs the local queue runs at the same time
    pub parallel_jobs: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::dispatch::DEFAULT_CHUNK_SIZE,
            parallel_jobs: 2,
        }
    }
}

/// Outbound request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Timeout for label/caption vision APIs (Google, AWS, Azure)
    pub vision_timeout_ms: u64,

    /// Timeout for the LLM provider (OpenAI)
    pub llm_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            vision_timeout_ms: 30_000,
            llm_timeout_ms: 60_000,
        }
    }
}

/// Where the catalog and audit database live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON asset catalog used by the CLI host
    pub catalog_path: String,

    /// SQLite file for the audit log
    pub audit_db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_path: "~/.altomatic/catalog.json".to_string(),
            audit_db_path: "~/.altomatic/audit.db".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
