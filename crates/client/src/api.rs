//! REST API client for the generation service.
//!
//! Wraps the upload and generation endpoints using [`reqwest`]. Error
//! bodies are parsed best-effort for a `message` field; anything else
//! falls back to the HTTP status line.

use std::time::Duration;

use genstudio_core::generation::{
    ENDPOINT_GENERATE, ENDPOINT_GENERATE_VIDEO, ENDPOINT_IMG2IMG, ENDPOINT_UPLOAD_IMAGE,
};
use genstudio_core::media::LocalFile;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::config::ServiceConfig;
use crate::messages::{
    ErrorBody, ImageGenerationBody, ImageResponse, UploadResponse, VideoGenerationBody,
    VideoResponse,
};

/// HTTP client for a single generation service.
#[derive(Clone)]
pub struct GenerationApi {
    client: reqwest::Client,
    api_url: String,
}

/// Errors from the generation service REST layer.
///
/// The `Display` text is the bare detail (no prefix) so callers can embed
/// it in their own user-facing messages.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (connection refused, DNS, TLS,
    /// timeout).
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("{}", describe_status(.status, .reason, .message))]
    Status {
        status: u16,
        /// Canonical reason phrase, e.g. `Internal Server Error`.
        reason: String,
        /// `message` field of the JSON error body, if any.
        message: Option<String>,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("{0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status code, for service-side failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(err) => err.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }
}

fn describe_status(status: &u16, reason: &str, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None if reason.is_empty() => format!("Server returned {status}"),
        None => format!("Server returned {status}: {reason}"),
    }
}

impl GenerationApi {
    /// Create a client with default `reqwest` settings.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:8000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client honouring the configured base URL and timeout.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Base HTTP URL this client talks to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Upload a source image as multipart form data.
    ///
    /// Sends `POST /upload-image` with the file under `field` (`file` or
    /// `image` depending on the workflow).
    pub async fn upload_image(
        &self,
        field: &str,
        file: &LocalFile,
    ) -> Result<UploadResponse, ApiError> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part(field.to_string(), part);

        let response = self
            .client
            .post(self.url(ENDPOINT_UPLOAD_IMAGE))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Text-to-image generation via `POST /generate`.
    pub async fn generate_image(
        &self,
        prompt: &str,
        num_images: u32,
    ) -> Result<ImageResponse, ApiError> {
        let body = ImageGenerationBody {
            prompt,
            num_images,
            image_path: None,
        };
        self.post_json(ENDPOINT_GENERATE, &body).await
    }

    /// Image-to-image generation via `POST /img2img`.
    ///
    /// `image_path` names the previously uploaded source. When `None` the
    /// service falls back to the most recent upload it received.
    pub async fn img2img(
        &self,
        prompt: &str,
        num_images: u32,
        image_path: Option<&str>,
    ) -> Result<ImageResponse, ApiError> {
        let body = ImageGenerationBody {
            prompt,
            num_images,
            image_path,
        };
        self.post_json(ENDPOINT_IMG2IMG, &body).await
    }

    /// Video generation via `POST /generate-video`.
    pub async fn generate_video(
        &self,
        prompt: &str,
        image_path: Option<&str>,
    ) -> Result<VideoResponse, ApiError> {
        let body = VideoGenerationBody { prompt, image_path };
        self.post_json(ENDPOINT_GENERATE_VIDEO, &body).await
    }

    // ---- private helpers ----

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_url, endpoint)
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(endpoint)).json(body).send().await?;
        Self::parse_response(response).await
    }

    /// Ensure the response has a success status code. On failure the body
    /// is read and searched for a `message` field.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.bytes().await {
            Ok(raw) => ErrorBody::message_from(&raw),
            Err(_) => None,
        };

        tracing::warn!(
            status = status.as_u16(),
            message = message.as_deref().unwrap_or(""),
            "Generation service returned an error status",
        );

        Err(ApiError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            message,
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let raw = response.bytes().await?;
        serde_json::from_slice::<T>(&raw).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
