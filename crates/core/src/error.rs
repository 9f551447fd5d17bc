/// Input problems caught locally, before any request is sent.
///
/// The `Display` text is what the view shows inline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a prompt")]
    EmptyPrompt,

    #[error("Please upload a source image first")]
    MissingSourceImage,

    #[error("Please upload an image file")]
    NotAnImage { mime_type: String },

    #[error("Number of images must be between {min} and {max}, got {count}")]
    VariantCountOutOfRange { count: u32, min: u32, max: u32 },
}
