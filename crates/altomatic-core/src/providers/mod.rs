//! Caption providers for ALT-text generation.
//!
//! Provides a provider abstraction over four vendor backends (OpenAI,
//! Google Vision, AWS Rekognition, Azure Vision). Exactly one provider is
//! active at a time, selected by `generation.provider` in the config.

pub(crate) mod aws;
pub(crate) mod azure;
pub(crate) mod google;
pub(crate) mod image;
pub mod labels;
pub(crate) mod openai;
pub(crate) mod provider;
pub mod sigv4;

pub use image::ImageInput;
pub use labels::{finalize_caption, labels_to_alt, MAX_CAPTION_CHARS};
pub use provider::{CaptionProvider, ProviderFactory};
