//! Error types for the Altomatic captioning pipeline.
//!
//! Errors are organized by component. Provider errors never escape a provider
//! (they are logged and turned into "no caption"); persistence errors are the
//! only pipeline failures that reach the caller.

use crate::types::AssetId;
use thiserror::Error;

/// Top-level error type for Altomatic operations.
#[derive(Error, Debug)]
pub enum AltomaticError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Asset store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Audit log errors
    #[error("Audit log error: {0}")]
    Audit(#[from] AuditError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Failures inside a vendor call.
///
/// These are caught at the provider boundary and reported through `tracing`
/// only; callers see an absent caption.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A required credential was not configured
    #[error("{provider}: missing credential {name}")]
    MissingCredential {
        provider: &'static str,
        name: &'static str,
    },

    /// Transport-level failure (DNS, connect, TLS, timeout inside reqwest)
    #[error("{provider} request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    /// Non-2xx response
    #[error("{provider} HTTP {status}: {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// Response body could not be decoded
    #[error("Failed to parse {provider} response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    /// The vendor answered but produced no usable text
    #[error("{provider} returned no caption")]
    Empty { provider: &'static str },

    /// The image bytes could not be loaded
    #[error("Failed to read image {locator}: {message}")]
    ImageRead { locator: String, message: String },

    /// The call exceeded the provider timeout
    #[error("{provider} timed out after {timeout_ms}ms")]
    Timeout {
        provider: &'static str,
        timeout_ms: u64,
    },
}

/// Errors reported by an asset store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store refused the element (framework-level validation)
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The store could not apply the write
    #[error("{0}")]
    Backend(String),

    /// Catalog file I/O failure
    #[error("Catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file could not be (de)serialized
    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort a single pipeline invocation.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The asset could not be loaded from the store
    #[error("Failed to load asset {asset_id}: {source}")]
    Load {
        asset_id: AssetId,
        #[source]
        source: StoreError,
    },

    /// The caption was generated but could not be written back
    #[error("Failed to persist caption for asset {asset_id}: {source}")]
    Persistence {
        asset_id: AssetId,
        #[source]
        source: StoreError,
    },
}

/// Audit log storage errors.
#[derive(Error, Debug)]
pub enum AuditError {
    /// SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection mutex was poisoned by a panicking writer
    #[error("Audit log connection poisoned")]
    Poisoned,
}

/// Convenience type alias for Altomatic results.
pub type Result<T> = std::result::Result<T, AltomaticError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
