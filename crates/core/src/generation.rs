//! Workflow catalogue, generation requests, and request validation.
//!
//! Each [`WorkflowKind`] fixes the endpoint it talks to, whether it takes
//! a source image, how many variants it may ask for, and what happens to
//! the prompt field once a request is accepted.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::media::MediaKind;

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Multipart upload of a source image.
pub const ENDPOINT_UPLOAD_IMAGE: &str = "/upload-image";
/// Text-to-image generation.
pub const ENDPOINT_GENERATE: &str = "/generate";
/// Image-to-image generation.
pub const ENDPOINT_IMG2IMG: &str = "/img2img";
/// Text (+ optional image) to video generation.
pub const ENDPOINT_GENERATE_VIDEO: &str = "/generate-video";

// ---------------------------------------------------------------------------
// Variant counts
// ---------------------------------------------------------------------------

/// Smallest number of images a request may ask for.
pub const MIN_VARIANT_COUNT: u32 = 1;
/// Largest number of images the text-to-image workflow offers.
pub const MAX_VARIANT_COUNT: u32 = 4;
/// Variant count used when the user has not picked one.
pub const DEFAULT_VARIANT_COUNT: u32 = 1;

// ---------------------------------------------------------------------------
// Workflow kinds
// ---------------------------------------------------------------------------

/// Whether a workflow sends a source image along with the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceImagePolicy {
    NotAccepted,
    Optional,
    Required,
}

/// What happens to the prompt input once a submit is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRetention {
    /// The field is emptied as soon as the request is accepted.
    ClearOnSubmit,
    /// The field keeps its text so the user can tweak and resubmit.
    Retain,
}

/// The three generation workflows offered by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    TextToImage,
    ImageToImage,
    ImageToVideo,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 3] = [
        WorkflowKind::TextToImage,
        WorkflowKind::ImageToImage,
        WorkflowKind::ImageToVideo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowKind::TextToImage => "text_to_image",
            WorkflowKind::ImageToImage => "image_to_image",
            WorkflowKind::ImageToVideo => "image_to_video",
        }
    }

    /// Generation endpoint path, relative to the service base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            WorkflowKind::TextToImage => ENDPOINT_GENERATE,
            WorkflowKind::ImageToImage => ENDPOINT_IMG2IMG,
            WorkflowKind::ImageToVideo => ENDPOINT_GENERATE_VIDEO,
        }
    }

    pub fn media_kind(self) -> MediaKind {
        match self {
            WorkflowKind::TextToImage | WorkflowKind::ImageToImage => MediaKind::Image,
            WorkflowKind::ImageToVideo => MediaKind::Video,
        }
    }

    pub fn source_image_policy(self) -> SourceImagePolicy {
        match self {
            WorkflowKind::TextToImage => SourceImagePolicy::NotAccepted,
            WorkflowKind::ImageToImage => SourceImagePolicy::Required,
            WorkflowKind::ImageToVideo => SourceImagePolicy::Optional,
        }
    }

    pub fn prompt_retention(self) -> PromptRetention {
        match self {
            WorkflowKind::ImageToImage => PromptRetention::Retain,
            WorkflowKind::TextToImage | WorkflowKind::ImageToVideo => {
                PromptRetention::ClearOnSubmit
            }
        }
    }

    /// Multipart field name the upload endpoint expects from this workflow,
    /// or `None` if the workflow never uploads.
    pub fn upload_field(self) -> Option<&'static str> {
        match self {
            WorkflowKind::TextToImage => None,
            WorkflowKind::ImageToImage => Some("file"),
            WorkflowKind::ImageToVideo => Some("image"),
        }
    }

    /// Variant counts this workflow accepts.
    pub fn variant_range(self) -> RangeInclusive<u32> {
        match self {
            WorkflowKind::TextToImage => MIN_VARIANT_COUNT..=MAX_VARIANT_COUNT,
            WorkflowKind::ImageToImage | WorkflowKind::ImageToVideo => {
                MIN_VARIANT_COUNT..=MIN_VARIANT_COUNT
            }
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Reference to a source image selected by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImageRef {
    /// Local display reference of the preview.
    pub preview_url: String,
    /// Filename confirmed by the service, once the upload has been
    /// acknowledged.
    pub remote_name: Option<String>,
}

/// A validated, immutable generation request.
///
/// Only constructible through [`GenerationRequest::new`], so every value in
/// circulation has passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    kind: WorkflowKind,
    prompt: String,
    source_image: Option<SourceImageRef>,
    variant_count: u32,
}

impl GenerationRequest {
    /// Validate the inputs for `kind` and build a request.
    ///
    /// A source image passed to a workflow that does not accept one is
    /// dropped.
    pub fn new(
        kind: WorkflowKind,
        prompt: impl Into<String>,
        source_image: Option<SourceImageRef>,
        variant_count: u32,
    ) -> Result<Self, ValidationError> {
        let prompt = prompt.into();
        validate_prompt(&prompt)?;
        validate_source_image(kind, source_image.as_ref())?;
        validate_variant_count(kind, variant_count)?;

        let source_image = match kind.source_image_policy() {
            SourceImagePolicy::NotAccepted => None,
            SourceImagePolicy::Optional | SourceImagePolicy::Required => source_image,
        };

        Ok(Self {
            kind,
            prompt,
            source_image,
            variant_count,
        })
    }

    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn source_image(&self) -> Option<&SourceImageRef> {
        self.source_image.as_ref()
    }

    /// Service-side name of the source image, if the upload was confirmed.
    pub fn source_image_name(&self) -> Option<&str> {
        self.source_image
            .as_ref()
            .and_then(|source| source.remote_name.as_deref())
    }

    pub fn variant_count(&self) -> u32 {
        self.variant_count
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Reject prompts that are empty once surrounding whitespace is removed.
pub fn validate_prompt(prompt: &str) -> Result<(), ValidationError> {
    if prompt.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    Ok(())
}

/// Reject a missing source image for workflows that require one.
pub fn validate_source_image(
    kind: WorkflowKind,
    source_image: Option<&SourceImageRef>,
) -> Result<(), ValidationError> {
    if kind.source_image_policy() == SourceImagePolicy::Required && source_image.is_none() {
        return Err(ValidationError::MissingSourceImage);
    }
    Ok(())
}

/// Reject variant counts outside the workflow's range.
pub fn validate_variant_count(kind: WorkflowKind, count: u32) -> Result<(), ValidationError> {
    let range = kind.variant_range();
    if !range.contains(&count) {
        return Err(ValidationError::VariantCountOutOfRange {
            count,
            min: *range.start(),
            max: *range.end(),
        });
    }
    Ok(())
}
