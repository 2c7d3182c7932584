//! Caption pipeline.
//!
//! - **caption**: load an asset, ask the provider, write the result back
//! - **guard**: per-asset advisory locks serialising concurrent runs

mod caption;
mod guard;

pub use caption::CaptionPipeline;
pub use guard::{AssetGuard, AssetLocks};
