//! JSON and multipart bodies exchanged with the generation service.

use serde::{Deserialize, Serialize};

/// Body of `POST /generate` and `POST /img2img`.
#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerationBody<'a> {
    pub prompt: &'a str,
    pub num_images: u32,
    /// Filename of the uploaded source image (image-to-image only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<&'a str>,
}

/// Body of `POST /generate-video`.
#[derive(Debug, Clone, Serialize)]
pub struct VideoGenerationBody<'a> {
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<&'a str>,
}

/// Success payload of the image endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageResponse {
    /// Path of the generated image, relative to the media origin.
    pub image_url: String,
}

/// Success payload of `POST /generate-video`.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoResponse {
    /// Path of the generated video, relative to the media origin.
    pub video_url: String,
}

/// Success payload of `POST /upload-image`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub original_filename: String,
}

/// Optional fields the service may put in an error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Best-effort extraction of the `message` field from a raw error body.
    ///
    /// Returns `None` for non-JSON bodies and for blank messages.
    pub fn message_from(raw: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(raw)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_body_omits_missing_source() {
        let body = ImageGenerationBody {
            prompt: "a red fox",
            num_images: 2,
            image_path: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"prompt": "a red fox", "num_images": 2}));
    }

    #[test]
    fn video_body_includes_source_when_present() {
        let body = VideoGenerationBody {
            prompt: "waves",
            image_path: Some("beach.png"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["image_path"], "beach.png");
    }

    #[test]
    fn error_message_is_best_effort() {
        assert_eq!(
            ErrorBody::message_from(br#"{"message":"GPU busy"}"#).as_deref(),
            Some("GPU busy")
        );
        assert_eq!(ErrorBody::message_from(br#"{"detail":"nope"}"#), None);
        assert_eq!(ErrorBody::message_from(br#"{"message":"  "}"#), None);
        assert_eq!(ErrorBody::message_from(b"<html>502</html>"), None);
        assert_eq!(ErrorBody::message_from(b""), None);
    }
}
