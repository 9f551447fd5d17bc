//! Source image selection, local preview, and background upload.
//!
//! [`UploadManager::select_file`] installs a preview immediately and
//! uploads the bytes in a spawned task. The upload outcome is reported
//! through the [`NotificationEmitter`] only; generation never waits for it.
//!
//! The manager is the sole owner of the current [`PreviewHandle`]. A newly
//! selected file releases the previous preview before its own is created,
//! and dropping the manager releases whatever is left.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use genstudio_client::service::{GenerationService, UploadAcknowledgement};
use genstudio_core::error::ValidationError;
use genstudio_core::generation::{SourceImageRef, WorkflowKind};
use genstudio_core::media::LocalFile;
use genstudio_events::{NotificationEmitter, Severity};
use tokio::task::JoinHandle;

use crate::preview::{PreviewHandle, PreviewStore};

/// Notification shown when an upload fails.
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload image";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A selected source image: its local preview plus, once the service has
/// confirmed it, the upload acknowledgement.
#[derive(Debug)]
pub struct UploadedAsset {
    preview: PreviewHandle,
    acknowledgement: Option<UploadAcknowledgement>,
}

impl UploadedAsset {
    pub fn preview_url(&self) -> &str {
        self.preview.url()
    }

    pub fn acknowledgement(&self) -> Option<&UploadAcknowledgement> {
        self.acknowledgement.as_ref()
    }
}

/// How a background upload ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Confirmed by the service and attached to the current preview.
    Acknowledged(UploadAcknowledgement),
    /// Confirmed, but the file had been replaced or cleared meanwhile.
    Stale(UploadAcknowledgement),
    /// The upload failed; the payload is the inline error text.
    Failed(String),
}

/// Handle to a background upload.
///
/// Dropping it detaches the upload; it still runs to completion.
#[derive(Debug)]
pub struct PendingUpload {
    handle: JoinHandle<UploadOutcome>,
}

impl PendingUpload {
    /// Wait for the upload to finish.
    pub async fn outcome(self) -> UploadOutcome {
        self.handle
            .await
            .unwrap_or_else(|e| UploadOutcome::Failed(format!("Error: {e}")))
    }
}

#[derive(Default)]
struct UploadSlot {
    asset: Option<UploadedAsset>,
    /// Bumped on every selection or clear so late uploads can tell they
    /// are stale.
    generation: u64,
    uploading: bool,
    last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// UploadManager
// ---------------------------------------------------------------------------

/// Owns the source image of one workflow.
pub struct UploadManager<S> {
    kind: WorkflowKind,
    field: &'static str,
    service: Arc<S>,
    notifications: Arc<NotificationEmitter>,
    previews: PreviewStore,
    slot: Arc<Mutex<UploadSlot>>,
}

impl<S: GenerationService> UploadManager<S> {
    /// Create a manager for `kind`, or `None` if that workflow never
    /// takes a source image.
    pub fn for_workflow(
        kind: WorkflowKind,
        service: Arc<S>,
        notifications: Arc<NotificationEmitter>,
        previews: PreviewStore,
    ) -> Option<Self> {
        let field = kind.upload_field()?;
        Some(Self {
            kind,
            field,
            service,
            notifications,
            previews,
            slot: Arc::new(Mutex::new(UploadSlot::default())),
        })
    }

    /// Select a new source image.
    ///
    /// Non-image files are rejected without touching the network or the
    /// current preview. Otherwise the previous preview is released, a new
    /// one is installed, and the upload starts in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn select_file(&self, file: LocalFile) -> Result<PendingUpload, ValidationError> {
        if !file.is_image() {
            let err = ValidationError::NotAnImage {
                mime_type: file.mime_type.clone(),
            };
            tracing::warn!(
                workflow = %self.kind,
                file = %file.name,
                mime_type = %file.mime_type,
                "Rejected non-image source file",
            );
            self.lock_slot().last_error = Some(err.to_string());
            return Err(err);
        }

        let generation = {
            let mut slot = self.lock_slot();
            // Release the superseded preview before creating its successor.
            drop(slot.asset.take());
            let preview = self.previews.create(&file);
            slot.asset = Some(UploadedAsset {
                preview,
                acknowledgement: None,
            });
            slot.generation += 1;
            slot.uploading = true;
            slot.last_error = None;
            slot.generation
        };

        tracing::info!(
            workflow = %self.kind,
            file = %file.name,
            size = file.bytes.len(),
            "Uploading source image",
        );

        let task = UploadTask {
            kind: self.kind,
            field: self.field,
            generation,
            service: Arc::clone(&self.service),
            notifications: Arc::clone(&self.notifications),
            slot: Arc::clone(&self.slot),
        };
        let handle = tokio::spawn(task.run(file));

        Ok(PendingUpload { handle })
    }

    /// Remove the current source image, releasing its preview. Any upload
    /// still in flight becomes stale.
    pub fn clear(&self) {
        let mut slot = self.lock_slot();
        drop(slot.asset.take());
        slot.generation += 1;
        slot.uploading = false;
        slot.last_error = None;
    }

    /// Reference to the current source image, for a generation request.
    pub fn source_image(&self) -> Option<SourceImageRef> {
        self.lock_slot().asset.as_ref().map(|asset| SourceImageRef {
            preview_url: asset.preview_url().to_string(),
            remote_name: asset
                .acknowledgement()
                .map(|ack| ack.original_filename.clone()),
        })
    }

    pub fn has_preview(&self) -> bool {
        self.lock_slot().asset.is_some()
    }

    pub fn preview_url(&self) -> Option<String> {
        self.lock_slot()
            .asset
            .as_ref()
            .map(|asset| asset.preview_url().to_string())
    }

    pub fn acknowledgement(&self) -> Option<UploadAcknowledgement> {
        self.lock_slot()
            .asset
            .as_ref()
            .and_then(|asset| asset.acknowledgement().cloned())
    }

    pub fn is_uploading(&self) -> bool {
        self.lock_slot().uploading
    }

    /// Inline error from the last rejected selection or failed upload.
    pub fn last_error(&self) -> Option<String> {
        self.lock_slot().last_error.clone()
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }
}

impl<S> UploadManager<S> {
    fn lock_slot(&self) -> MutexGuard<'_, UploadSlot> {
        lock(&self.slot)
    }
}

impl<S> Drop for UploadManager<S> {
    fn drop(&mut self) {
        // Upload tasks may still hold the slot; release the preview now.
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        drop(slot.asset.take());
    }
}

fn lock(slot: &Mutex<UploadSlot>) -> MutexGuard<'_, UploadSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Background upload
// ---------------------------------------------------------------------------

struct UploadTask<S> {
    kind: WorkflowKind,
    field: &'static str,
    generation: u64,
    service: Arc<S>,
    notifications: Arc<NotificationEmitter>,
    slot: Arc<Mutex<UploadSlot>>,
}

impl<S: GenerationService> UploadTask<S> {
    async fn run(self, file: LocalFile) -> UploadOutcome {
        let result = self.service.upload_image(self.field, &file).await;

        match result {
            Ok(ack) => {
                let current = self.with_current_slot(|slot| {
                    slot.uploading = false;
                    if let Some(asset) = slot.asset.as_mut() {
                        asset.acknowledgement = Some(ack.clone());
                    }
                });

                tracing::info!(
                    workflow = %self.kind,
                    original_filename = %ack.original_filename,
                    current,
                    "Source image uploaded",
                );
                self.notifications.emit(
                    format!("{} uploaded successfully", ack.original_filename),
                    Severity::Success,
                );

                if current {
                    UploadOutcome::Acknowledged(ack)
                } else {
                    UploadOutcome::Stale(ack)
                }
            }
            Err(e) => {
                let message = format!("Error: {e}");
                self.with_current_slot(|slot| {
                    slot.uploading = false;
                    slot.last_error = Some(message.clone());
                });

                tracing::warn!(
                    workflow = %self.kind,
                    file = %file.name,
                    error = %e,
                    "Source image upload failed",
                );
                self.notifications.emit(UPLOAD_FAILED_MESSAGE, Severity::Error);

                UploadOutcome::Failed(message)
            }
        }
    }

    /// Apply `update` only if no newer selection has replaced this one.
    /// Returns whether the update was applied.
    fn with_current_slot(&self, update: impl FnOnce(&mut UploadSlot)) -> bool {
        let mut slot = lock(&self.slot);
        if slot.generation != self.generation {
            return false;
        }
        update(&mut slot);
        true
    }
}
