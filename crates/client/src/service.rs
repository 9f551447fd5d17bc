//! The service boundary the workflows are written against.
//!
//! [`GenerationService`] abstracts the remote generation service so the
//! lifecycle controller and upload manager can run against
//! [`GenerationApi`] in production and an in-memory double in tests.

use async_trait::async_trait;
use genstudio_core::generation::{GenerationRequest, WorkflowKind};
use genstudio_core::media::LocalFile;

use crate::api::{ApiError, GenerationApi};

/// Service-confirmed identity of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAcknowledgement {
    /// Filename the service stored the upload under.
    pub original_filename: String,
}

/// Operations the remote generation service offers.
#[async_trait]
pub trait GenerationService: Send + Sync + 'static {
    /// Run a generation and return the raw media locator from the response
    /// (usually a path relative to the media origin).
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ApiError>;

    /// Upload a source image under the given multipart field name.
    async fn upload_image(
        &self,
        field: &str,
        file: &LocalFile,
    ) -> Result<UploadAcknowledgement, ApiError>;
}

#[async_trait]
impl GenerationService for GenerationApi {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ApiError> {
        let prompt = request.prompt();
        match request.kind() {
            WorkflowKind::TextToImage => {
                let response = self.generate_image(prompt, request.variant_count()).await?;
                Ok(response.image_url)
            }
            WorkflowKind::ImageToImage => {
                let response = self
                    .img2img(prompt, request.variant_count(), request.source_image_name())
                    .await?;
                Ok(response.image_url)
            }
            WorkflowKind::ImageToVideo => {
                let response = self
                    .generate_video(prompt, request.source_image_name())
                    .await?;
                Ok(response.video_url)
            }
        }
    }

    async fn upload_image(
        &self,
        field: &str,
        file: &LocalFile,
    ) -> Result<UploadAcknowledgement, ApiError> {
        let response = GenerationApi::upload_image(self, field, file).await?;
        Ok(UploadAcknowledgement {
            original_filename: response.original_filename,
        })
    }
}
