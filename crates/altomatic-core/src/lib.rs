//! Altomatic Core - ALT-text generation library.
//!
//! Altomatic fills an image asset's alternative-text attribute with a caption
//! produced by one of several vision providers, either for a single asset or
//! for the whole library in bounded batch jobs.
//!
//! # Architecture
//!
//! ```text
//! BatchDispatcher → JobQueue → GenerateJob → CaptionPipeline → CaptionProvider
//!        ↓                                          ↓
//!     AuditLog                                  AssetStore
//! ```
//!
//! Every service is constructed explicitly and shared via `Arc`; there is no
//! global accessor.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use altomatic_core::{CaptionPipeline, CatalogStore, Config, ProviderFactory};
//!
//! #[tokio::main]
//! async fn main() -> altomatic_core::Result<()> {
//!     let config = Arc::new(Config::load()?);
//!     let store = Arc::new(CatalogStore::open(&config.catalog_path()).await?);
//!     let provider = Arc::from(ProviderFactory::create(&config));
//!     let pipeline = CaptionPipeline::new(config, provider, store);
//!
//!     let outcome = pipeline.generate(42).await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod audit;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod providers;
pub mod stats;
pub mod store;
pub mod types;

// Re-exports for convenient access
pub use audit::{AuditEvent, AuditLog, LogEntry};
pub use config::{Config, ProviderKind, Readiness};
pub use dispatch::{
    BatchDispatcher, BatchJob, Dispatched, GenerateJob, JobQueue, JobReport, LocalQueue,
    SubmitResponse,
};
pub use error::{
    AltomaticError, AuditError, ConfigError, PipelineError, PipelineResult, ProviderError,
    Result, StoreError,
};
pub use pipeline::CaptionPipeline;
pub use providers::{CaptionProvider, ProviderFactory};
pub use stats::{Stats, StatsCollector};
pub use store::{AssetStore, CatalogScanner, CatalogStore};
pub use types::{
    Actor, Asset, AssetId, AssetKind, CaptionOutcome, CaptionResult, ImageLocator, SkipReason,
    TargetField, UserId,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
