//! Core data types shared by the pipeline, dispatcher and stores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Identifier of an asset in the host element store.
pub type AssetId = u64;

/// Identifier of an acting user.
pub type UserId = u64;

/// Broad asset kind. Only images are captioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    #[default]
    Other,
}

/// An asset as seen by the pipeline.
///
/// Assets are owned by the host store; the pipeline only changes the
/// configured target attribute and asks the store to save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Store identifier
    pub id: AssetId,

    /// Filename portion, used for display and MIME detection
    pub filename: String,

    /// Image or anything else
    #[serde(default)]
    pub kind: AssetKind,

    /// Publicly resolvable URL, if the volume has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Local filesystem path, if the storage backend exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,

    /// Generic title attribute
    #[serde(default)]
    pub title: String,

    /// Dedicated alternative-text attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// Custom plain-text fields keyed by handle
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl Asset {
    /// Create an image asset with no locator and empty attributes.
    pub fn image(id: AssetId, filename: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            kind: AssetKind::Image,
            url: None,
            local_path: None,
            title: String::new(),
            alt: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == AssetKind::Image
    }

    /// Current value of the target attribute, if any.
    pub fn target_value(&self, target: &TargetField) -> Option<&str> {
        match target {
            TargetField::AltText => self.alt.as_deref(),
            TargetField::Title => Some(self.title.as_str()),
            TargetField::Named(handle) => self.fields.get(handle).map(String::as_str),
        }
    }

    /// Whether the target attribute holds non-whitespace text.
    pub fn has_target_value(&self, target: &TargetField) -> bool {
        self.target_value(target)
            .is_some_and(|value| !value.trim().is_empty())
    }

    /// Overwrite the target attribute.
    pub fn set_target_value(&mut self, target: &TargetField, value: String) {
        match target {
            TargetField::AltText => self.alt = Some(value),
            TargetField::Title => self.title = value,
            TargetField::Named(handle) => {
                self.fields.insert(handle.clone(), value);
            }
        }
    }

    /// Resolve where the provider should read the image from.
    ///
    /// A public URL wins over a local path.
    pub fn image_locator(&self) -> Option<ImageLocator> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Some(ImageLocator::Url(url.to_string()));
        }
        self.local_path.clone().map(ImageLocator::Path)
    }
}

/// Which attribute receives the generated caption.
///
/// Serialized as `"alt"`, `"title"`, or any other string as a field handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum TargetField {
    /// The asset's dedicated alternative-text attribute
    #[default]
    AltText,
    /// The generic title attribute
    Title,
    /// A custom plain-text field
    Named(String),
}

impl From<String> for TargetField {
    fn from(value: String) -> Self {
        match value.trim() {
            "alt" | "alternativeText" => TargetField::AltText,
            "title" => TargetField::Title,
            handle => TargetField::Named(handle.to_string()),
        }
    }
}

impl From<TargetField> for String {
    fn from(value: TargetField) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetField::AltText => write!(f, "alt"),
            TargetField::Title => write!(f, "title"),
            TargetField::Named(handle) => write!(f, "{handle}"),
        }
    }
}

/// Where a provider reads an image from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocator {
    /// Remote URL, passed through to providers that accept URLs
    Url(String),
    /// Local file, read and inlined for providers that accept bytes
    Path(PathBuf),
}

impl fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageLocator::Url(url) => write!(f, "{url}"),
            ImageLocator::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Why the pipeline did not write a caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "details", rename_all = "snake_case")]
pub enum SkipReason {
    NotImage,
    NotFound,
    /// Provider credentials are incomplete; carries the readiness errors
    NotConfigured(Vec<String>),
    /// Target already populated and overwriting is off
    AlreadyHasValue,
    NoImageLocator,
    /// The provider produced nothing usable
    NoCaption,
}

impl SkipReason {
    /// Skips that mean there was nothing to do, as opposed to a problem.
    pub fn is_expected(&self) -> bool {
        matches!(self, SkipReason::NotImage | SkipReason::AlreadyHasValue)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotImage => write!(f, "not an image"),
            SkipReason::NotFound => write!(f, "asset not found"),
            SkipReason::NotConfigured(errors) => {
                write!(f, "not configured: {}", errors.join(" "))
            }
            SkipReason::AlreadyHasValue => write!(f, "target already has a value"),
            SkipReason::NoImageLocator => write!(f, "no image URL or local path"),
            SkipReason::NoCaption => write!(f, "provider returned no caption"),
        }
    }
}

/// Result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaptionOutcome {
    Written { caption: String },
    Skipped(SkipReason),
}

impl CaptionOutcome {
    /// The written caption, if any.
    pub fn caption(&self) -> Option<&str> {
        match self {
            CaptionOutcome::Written { caption } => Some(caption),
            CaptionOutcome::Skipped(_) => None,
        }
    }
}

/// Per-asset record produced by a batch job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionResult {
    pub asset_id: AssetId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    pub succeeded: bool,

    /// Nothing needed doing; neither written nor failed
    pub skipped: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl CaptionResult {
    pub fn from_outcome(asset_id: AssetId, outcome: CaptionOutcome) -> Self {
        match outcome {
            CaptionOutcome::Written { caption } => Self {
                asset_id,
                caption: Some(caption),
                succeeded: true,
                skipped: false,
                error_reason: None,
            },
            CaptionOutcome::Skipped(reason) => Self {
                asset_id,
                caption: None,
                succeeded: false,
                skipped: reason.is_expected(),
                error_reason: Some(reason.to_string()),
            },
        }
    }

    pub fn failed(asset_id: AssetId, error: impl fmt::Display) -> Self {
        Self {
            asset_id,
            caption: None,
            succeeded: false,
            skipped: false,
            error_reason: Some(error.to_string()),
        }
    }
}

/// The acting user recorded in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
