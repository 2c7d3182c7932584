//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::providers::MAX_CAPTION_CHARS;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.max_length == 0 {
            return Err(ConfigError::ValidationError(
                "generation.max_length must be > 0".into(),
            ));
        }
        if self.generation.max_length > MAX_CAPTION_CHARS {
            return Err(ConfigError::ValidationError(format!(
                "generation.max_length must be <= {MAX_CAPTION_CHARS}"
            )));
        }
        if self.dispatch.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.chunk_size must be > 0".into(),
            ));
        }
        if self.dispatch.parallel_jobs == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.parallel_jobs must be > 0".into(),
            ));
        }
        if self.limits.vision_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.vision_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
