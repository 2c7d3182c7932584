//! Credential resolution and readiness checks.
//!
//! A credential is taken from the config file first (literal or `${ENV_VAR}`
//! reference), then from the matching `ALTOMATIC_*` environment variable.
//! The environment is injected as a lookup function so tests never touch the
//! process environment.

use serde::Serialize;

use super::{Config, ProviderKind};
use crate::types::TargetField;

/// Environment accessor used during resolution.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub const OPENAI_API_KEY_VAR: &str = "ALTOMATIC_OPENAI_API_KEY";
pub const GOOGLE_API_KEY_VAR: &str = "ALTOMATIC_GOOGLE_API_KEY";
pub const AWS_KEY_VAR: &str = "ALTOMATIC_AWS_KEY";
pub const AWS_SECRET_VAR: &str = "ALTOMATIC_AWS_SECRET";
pub const AWS_REGION_VAR: &str = "ALTOMATIC_AWS_REGION";
pub const AZURE_ENDPOINT_VAR: &str = "ALTOMATIC_AZURE_ENDPOINT";
pub const AZURE_KEY_VAR: &str = "ALTOMATIC_AZURE_KEY";

/// Read a variable from the real process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Resolve `${ENV_VAR}` references in config strings.
///
/// Plain values pass through; empty values and unset references yield `None`.
pub fn resolve_env_var(value: &str, env: EnvLookup<'_>) -> Option<String> {
    let value = value.trim();
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        env(var_name).filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Stored value first, then the fallback environment variable.
pub fn resolve_credential(
    stored: Option<&str>,
    fallback_var: &str,
    env: EnvLookup<'_>,
) -> Option<String> {
    stored
        .and_then(|value| resolve_env_var(value, env))
        .or_else(|| env(fallback_var).filter(|v| !v.trim().is_empty()))
}

/// Fully resolved credentials for every provider.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub aws_access_key: Option<String>,
    pub aws_secret_key: Option<String>,
    pub aws_region: Option<String>,
    pub azure_endpoint: Option<String>,
    pub azure_api_key: Option<String>,
}

/// Outcome of [`Config::is_configured`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub errors: Vec<String>,
}

impl Readiness {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            ready: errors.is_empty(),
            errors,
        }
    }
}

impl Config {
    /// Resolve credentials against the process environment.
    pub fn credentials(&self) -> Credentials {
        self.credentials_with(&process_env)
    }

    /// Resolve credentials against an injected environment.
    pub fn credentials_with(&self, env: EnvLookup<'_>) -> Credentials {
        let p = &self.providers;
        Credentials {
            openai_api_key: resolve_credential(p.openai.api_key.as_deref(), OPENAI_API_KEY_VAR, env),
            google_api_key: resolve_credential(p.google.api_key.as_deref(), GOOGLE_API_KEY_VAR, env),
            aws_access_key: resolve_credential(p.aws.access_key.as_deref(), AWS_KEY_VAR, env),
            aws_secret_key: resolve_credential(p.aws.secret_key.as_deref(), AWS_SECRET_VAR, env),
            aws_region: resolve_credential(p.aws.region.as_deref(), AWS_REGION_VAR, env),
            azure_endpoint: resolve_credential(p.azure.endpoint.as_deref(), AZURE_ENDPOINT_VAR, env),
            azure_api_key: resolve_credential(p.azure.api_key.as_deref(), AZURE_KEY_VAR, env),
        }
    }

    /// Check that the selected provider has everything it needs.
    pub fn is_configured(&self) -> Readiness {
        self.is_configured_with(&process_env)
    }

    /// Same as [`Config::is_configured`] with an injected environment.
    ///
    /// Every missing condition adds one message; checks never short-circuit.
    pub fn is_configured_with(&self, env: EnvLookup<'_>) -> Readiness {
        let creds = self.credentials_with(env);
        let mut errors = Vec::new();

        if let TargetField::Named(handle) = &self.generation.target_field {
            if handle.trim().is_empty() {
                errors.push("Target field is not selected.".to_string());
            }
        }

        match self.generation.provider {
            ProviderKind::Openai => {
                if creds.openai_api_key.is_none() {
                    errors.push(format!(
                        "OpenAI API key is missing (set in config or {OPENAI_API_KEY_VAR})."
                    ));
                }
            }
            ProviderKind::Google => {
                if creds.google_api_key.is_none() {
                    errors.push(format!(
                        "Google API key is missing (set in config or {GOOGLE_API_KEY_VAR})."
                    ));
                }
            }
            ProviderKind::Aws => {
                if creds.aws_access_key.is_none() || creds.aws_secret_key.is_none() {
                    errors.push("AWS credentials are missing (AWS key/secret).".to_string());
                }
                if creds.aws_region.is_none() {
                    errors.push("AWS region is missing.".to_string());
                }
            }
            ProviderKind::Azure => {
                if creds.azure_endpoint.is_none() || creds.azure_api_key.is_none() {
                    errors.push("Azure endpoint/key are missing.".to_string());
                }
            }
        }

        Readiness::from_errors(errors)
    }
}
