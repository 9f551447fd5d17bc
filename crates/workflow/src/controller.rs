//! Request lifecycle state machine for one workflow.
//!
//! `Idle -> Submitting -> (Succeeded | Failed)`, and from either terminal
//! state back to `Submitting` on the next accepted submit. Only one
//! request may be in flight: a submit while `Submitting` is rejected here,
//! regardless of whether the view disabled its trigger.
//!
//! Every accepted submit gets a ticket id; a response is only applied if
//! its ticket is still the one in flight. The service call runs in a task
//! the controller spawns, so a request resolves even if the caller stops
//! waiting for it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use genstudio_client::api::ApiError;
use genstudio_client::config::ServiceConfig;
use genstudio_client::service::GenerationService;
use genstudio_core::error::ValidationError;
use genstudio_core::generation::{GenerationRequest, SourceImageRef, WorkflowKind};
use genstudio_core::media::GenerationResult;
use genstudio_core::types::RequestId;
use tokio::sync::watch;
use uuid::Uuid;

/// Detail used when a failure carries no message of its own.
pub const UNKNOWN_ERROR_DETAIL: &str = "An unknown error occurred";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Where the current generation request stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Submitting,
    Succeeded(GenerationResult),
    /// User-facing error message.
    Failed(String),
}

impl LifecycleState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, LifecycleState::Submitting)
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        match self {
            LifecycleState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LifecycleState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Why a submit was refused before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A generation request is already in progress")]
    Busy,
}

/// An accepted request that has not been resolved yet.
#[must_use = "an accepted submit stays in `Submitting` until resolved"]
#[derive(Debug)]
pub(crate) struct SubmitTicket {
    id: RequestId,
    request: GenerationRequest,
}

// ---------------------------------------------------------------------------
// RequestController
// ---------------------------------------------------------------------------

/// Owns the [`LifecycleState`] of one workflow.
///
/// State changes are published on a `watch` channel; call
/// [`subscribe`](Self::subscribe) to follow them.
pub struct RequestController<S> {
    service: Arc<S>,
    shared: Arc<Lifecycle>,
}

/// State shared between the controller and its request tasks.
struct Lifecycle {
    kind: WorkflowKind,
    /// Base URL named in failure guidance.
    api_url: String,
    /// Origin that returned media locators are resolved against.
    media_origin: String,
    state: watch::Sender<LifecycleState>,
    in_flight: Mutex<Option<RequestId>>,
}

impl<S: GenerationService> RequestController<S> {
    pub fn new(kind: WorkflowKind, service: Arc<S>, config: &ServiceConfig) -> Self {
        let (state, _) = watch::channel(LifecycleState::Idle);
        Self {
            service,
            shared: Arc::new(Lifecycle {
                kind,
                api_url: config.api_url.clone(),
                media_origin: config.media_origin.clone(),
                state,
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn kind(&self) -> WorkflowKind {
        self.shared.kind
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LifecycleState {
        self.shared.state.borrow().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.shared.state.borrow().is_submitting()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.shared.state.subscribe()
    }

    /// Validate, send, and resolve one generation request.
    ///
    /// Returns `Err` only when the request was refused locally, in which
    /// case the state is untouched and nothing was sent. Service and
    /// transport failures end in [`LifecycleState::Failed`] and are
    /// returned as `Ok`.
    ///
    /// Dropping the returned future does not cancel the request; it still
    /// resolves and releases the in-flight slot. Must be called from within
    /// a Tokio runtime.
    pub async fn submit(
        &self,
        prompt: &str,
        source_image: Option<SourceImageRef>,
        variant_count: u32,
    ) -> Result<LifecycleState, SubmitError> {
        let ticket = self.begin(prompt, source_image, variant_count)?;
        Ok(self.resolve(ticket).await)
    }

    /// Accept a request and move to `Submitting`, or refuse it.
    pub(crate) fn begin(
        &self,
        prompt: &str,
        source_image: Option<SourceImageRef>,
        variant_count: u32,
    ) -> Result<SubmitTicket, SubmitError> {
        let kind = self.shared.kind;
        let request = GenerationRequest::new(kind, prompt, source_image, variant_count)
            .inspect_err(|e| {
                tracing::debug!(workflow = %kind, error = %e, "Submit refused by validation");
            })?;

        let id = Uuid::new_v4();
        let accepted = self.shared.state.send_if_modified(|state| {
            if state.is_submitting() {
                return false;
            }
            *state = LifecycleState::Submitting;
            *self.shared.lock_in_flight() = Some(id);
            true
        });

        if !accepted {
            tracing::warn!(workflow = %kind, "Submit refused, request already in flight");
            return Err(SubmitError::Busy);
        }

        tracing::info!(
            workflow = %kind,
            request_id = %id,
            variant_count = request.variant_count(),
            has_source = request.source_image().is_some(),
            "Generation request submitted",
        );

        Ok(SubmitTicket { id, request })
    }

    /// Send the accepted request and apply its outcome.
    ///
    /// The call and the state update run in a spawned task; this only
    /// waits for it.
    pub(crate) async fn resolve(&self, ticket: SubmitTicket) -> LifecycleState {
        let SubmitTicket { id, request } = ticket;
        let service = Arc::clone(&self.service);
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            let outcome = service.generate(&request).await;
            let next = shared.outcome_state(id, outcome);
            shared.apply(id, next);
        });

        if let Err(e) = task.await {
            tracing::error!(
                workflow = %self.shared.kind,
                request_id = %id,
                error = %e,
                "Generation task failed",
            );
            let next = LifecycleState::Failed(self.shared.failure_message(""));
            self.shared.apply(id, next);
        }

        self.state()
    }
}

impl Lifecycle {
    /// Move to `next` if `id` is still the request in flight.
    fn apply(&self, id: RequestId, next: LifecycleState) {
        let applied = self.state.send_if_modified(|state| {
            let mut in_flight = self.lock_in_flight();
            if *in_flight != Some(id) || !state.is_submitting() {
                return false;
            }
            *in_flight = None;
            *state = next;
            true
        });

        if !applied {
            tracing::warn!(
                workflow = %self.kind,
                request_id = %id,
                "Discarding response for a request that is no longer current",
            );
        }
    }

    fn outcome_state(&self, id: RequestId, outcome: Result<String, ApiError>) -> LifecycleState {
        let locator = match outcome {
            Ok(locator) if !locator.trim().is_empty() => locator,
            Ok(_) => {
                tracing::warn!(
                    workflow = %self.kind,
                    request_id = %id,
                    "Response carried no media URL",
                );
                return LifecycleState::Failed(
                    self.failure_message("Response did not include a media URL"),
                );
            }
            Err(e) => {
                tracing::warn!(
                    workflow = %self.kind,
                    request_id = %id,
                    status = e.status(),
                    error = %e,
                    "Generation request failed",
                );
                return LifecycleState::Failed(self.failure_message(&e.to_string()));
            }
        };

        let result =
            GenerationResult::from_locator(&self.media_origin, &locator, self.kind.media_kind());
        tracing::info!(
            workflow = %self.kind,
            request_id = %id,
            media_url = %result.media_url,
            "Generation request succeeded",
        );
        LifecycleState::Succeeded(result)
    }

    /// User-facing failure text, always ending with service guidance.
    fn failure_message(&self, detail: &str) -> String {
        let detail = match detail.trim() {
            "" => UNKNOWN_ERROR_DETAIL,
            detail => detail,
        };
        format!(
            "Error: {detail}. Make sure the server is running at {}",
            self.api_url
        )
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<RequestId>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
