//! One generation workflow instance, as a view would own it.
//!
//! [`Workflow`] wires the prompt field, variant selector, source upload,
//! request controller, notifications, and the full-size overlay toggle
//! together, and exposes only the operations a view triggers.
//!
//! Dropping a workflow is its teardown: the source preview is released
//! and the notification timer is cancelled, whatever uploads or requests
//! are still running.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use genstudio_client::config::ServiceConfig;
use genstudio_client::service::GenerationService;
use genstudio_core::error::ValidationError;
use genstudio_core::generation::{
    validate_variant_count, PromptRetention, WorkflowKind, DEFAULT_VARIANT_COUNT,
};
use genstudio_core::media::LocalFile;
use genstudio_events::NotificationEmitter;
use tokio::sync::watch;

use crate::controller::{LifecycleState, RequestController, SubmitError};
use crate::presenter::{present, ViewModel, WorkflowSnapshot};
use crate::preview::PreviewStore;
use crate::prompt::PromptInput;
use crate::upload::{PendingUpload, UploadManager};

/// Why a file selection was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectFileError {
    #[error("The {0} workflow does not take a source image")]
    SourceNotAccepted(WorkflowKind),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub struct Workflow<S: GenerationService> {
    kind: WorkflowKind,
    prompt: PromptInput,
    variant_count: AtomicU32,
    controller: RequestController<S>,
    uploads: Option<UploadManager<S>>,
    notifications: Arc<NotificationEmitter>,
    overlay_open: AtomicBool,
    inline_error: Mutex<Option<String>>,
}

impl<S: GenerationService> Workflow<S> {
    /// Create a workflow with its own preview store and notification
    /// emitter.
    pub fn new(kind: WorkflowKind, service: Arc<S>, config: &ServiceConfig) -> Self {
        Self::with_parts(
            kind,
            service,
            config,
            PreviewStore::new(),
            Arc::new(NotificationEmitter::default()),
        )
    }

    /// Create a workflow around an existing preview store and emitter.
    ///
    /// The emitter is closed when the workflow is dropped.
    pub fn with_parts(
        kind: WorkflowKind,
        service: Arc<S>,
        config: &ServiceConfig,
        previews: PreviewStore,
        notifications: Arc<NotificationEmitter>,
    ) -> Self {
        let uploads = UploadManager::for_workflow(
            kind,
            Arc::clone(&service),
            Arc::clone(&notifications),
            previews,
        );
        Self {
            kind,
            prompt: PromptInput::new(),
            variant_count: AtomicU32::new(DEFAULT_VARIANT_COUNT),
            controller: RequestController::new(kind, service, config),
            uploads,
            notifications,
            overlay_open: AtomicBool::new(false),
            inline_error: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    // ---- inputs ----

    pub fn set_prompt(&self, text: impl Into<String>) {
        self.prompt.set(text);
    }

    pub fn prompt(&self) -> String {
        self.prompt.text()
    }

    /// Choose how many images to generate. Only the text-to-image workflow
    /// offers a choice; the others accept their fixed count only.
    pub fn set_variant_count(&self, count: u32) -> Result<(), ValidationError> {
        validate_variant_count(self.kind, count)?;
        self.variant_count.store(count, Ordering::Relaxed);
        Ok(())
    }

    pub fn variant_count(&self) -> u32 {
        self.variant_count.load(Ordering::Relaxed)
    }

    /// Select a source image: preview now, upload in the background.
    pub fn select_file(&self, file: LocalFile) -> Result<PendingUpload, SelectFileError> {
        let uploads = self
            .uploads
            .as_ref()
            .ok_or(SelectFileError::SourceNotAccepted(self.kind))?;
        Ok(uploads.select_file(file)?)
    }

    /// Remove the selected source image.
    pub fn clear_source(&self) {
        if let Some(uploads) = &self.uploads {
            uploads.clear();
        }
    }

    pub fn uploads(&self) -> Option<&UploadManager<S>> {
        self.uploads.as_ref()
    }

    // ---- generation ----

    /// Submit the current prompt (and source image, if any).
    ///
    /// Local refusals leave the lifecycle untouched and are also kept as
    /// the inline error. Once accepted, the prompt field is cleared for
    /// workflows that clear on submit, and the call resolves when the
    /// service answers.
    pub async fn submit(&self) -> Result<LifecycleState, SubmitError> {
        let prompt = self.prompt.text();
        let source_image = self.uploads.as_ref().and_then(|u| u.source_image());

        let ticket = match self
            .controller
            .begin(&prompt, source_image, self.variant_count())
        {
            Ok(ticket) => ticket,
            Err(err) => {
                if let SubmitError::Validation(validation) = &err {
                    *self.lock_inline_error() = Some(validation.to_string());
                }
                return Err(err);
            }
        };

        *self.lock_inline_error() = None;
        self.overlay_open.store(false, Ordering::Relaxed);
        if self.kind.prompt_retention() == PromptRetention::ClearOnSubmit {
            self.prompt.clear();
        }

        Ok(self.controller.resolve(ticket).await)
    }

    pub fn state(&self) -> LifecycleState {
        self.controller.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.controller.subscribe()
    }

    pub fn notifications(&self) -> &Arc<NotificationEmitter> {
        &self.notifications
    }

    // ---- overlay ----

    /// Open the full-size view of the current result. Returns `false`
    /// (and stays closed) when there is no result to show.
    pub fn open_overlay(&self) -> bool {
        let has_result = self.controller.state().result().is_some();
        self.overlay_open.store(has_result, Ordering::Relaxed);
        has_result
    }

    pub fn close_overlay(&self) {
        self.overlay_open.store(false, Ordering::Relaxed);
    }

    // ---- presentation ----

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let lifecycle = self.controller.state();
        let overlay_open =
            self.overlay_open.load(Ordering::Relaxed) && lifecycle.result().is_some();
        let uploads = self.uploads.as_ref();

        WorkflowSnapshot {
            kind: self.kind,
            lifecycle,
            prompt: self.prompt.text(),
            variant_count: self.variant_count(),
            source_preview: uploads.and_then(|u| u.preview_url()),
            source_acknowledged: uploads.is_some_and(|u| u.acknowledgement().is_some()),
            uploading: uploads.is_some_and(|u| u.is_uploading()),
            upload_error: uploads.and_then(|u| u.last_error()),
            inline_error: self.lock_inline_error().clone(),
            notification: self.notifications.current(),
            overlay_open,
        }
    }

    pub fn view(&self) -> ViewModel {
        present(&self.snapshot())
    }

    fn lock_inline_error(&self) -> MutexGuard<'_, Option<String>> {
        self.inline_error.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: GenerationService> Drop for Workflow<S> {
    fn drop(&mut self) {
        tracing::debug!(workflow = %self.kind, "Tearing down workflow");
        self.notifications.close();
    }
}
