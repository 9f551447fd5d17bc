#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use genstudio_client::api::ApiError;
use genstudio_client::config::ServiceConfig;
use genstudio_client::service::{GenerationService, UploadAcknowledgement};
use genstudio_core::generation::GenerationRequest;
use genstudio_core::media::LocalFile;

/// Origin used for both the API and the media in tests.
pub const ORIGIN: &str = "http://127.0.0.1:8000";

pub fn test_config() -> ServiceConfig {
    ServiceConfig::for_origin(ORIGIN)
}

/// A scripted reply from the mock service.
#[derive(Debug, Clone)]
pub enum Reply {
    /// 2xx with this media locator.
    Media(String),
    /// Non-2xx with an optional `message`.
    Status {
        status: u16,
        reason: &'static str,
        message: Option<String>,
    },
    /// 2xx with a body that could not be parsed.
    Malformed(String),
}

impl Reply {
    pub fn media(locator: &str) -> Self {
        Reply::Media(locator.into())
    }

    fn into_result(self) -> Result<String, ApiError> {
        match self {
            Reply::Media(locator) => Ok(locator),
            Reply::Status {
                status,
                reason,
                message,
            } => Err(ApiError::Status {
                status,
                reason: reason.into(),
                message,
            }),
            Reply::Malformed(detail) => Err(ApiError::Decode(detail)),
        }
    }
}

/// In-memory [`GenerationService`] that records and counts every call.
///
/// Generation replies are popped from a queue (falling back to
/// `/img/1.png`). Either call can be held open with a gate until the test
/// releases it.
#[derive(Default)]
pub struct MockService {
    generate_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<GenerationRequest>>,
    uploads: Mutex<Vec<(String, String)>>,
    upload_failures: Mutex<VecDeque<bool>>,
    generate_gate: Option<Arc<Notify>>,
    upload_gate: Option<Arc<Notify>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Hold every generation until `gate` is notified once per call.
    pub fn with_generate_gate(mut self, gate: Arc<Notify>) -> Self {
        self.generate_gate = Some(gate);
        self
    }

    /// Hold every upload until `gate` is notified once per call.
    pub fn with_upload_gate(mut self, gate: Arc<Notify>) -> Self {
        self.upload_gate = Some(gate);
        self
    }

    /// Make the next upload fail with a 500.
    pub fn fail_next_upload(self) -> Self {
        self.upload_failures.lock().unwrap().push_back(true);
        self
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `(field, file name)` of every upload received.
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for MockService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ApiError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(gate) = &self.generate_gate {
            gate.notified().await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::media("/img/1.png"));
        reply.into_result()
    }

    async fn upload_image(
        &self,
        field: &str,
        file: &LocalFile,
    ) -> Result<UploadAcknowledgement, ApiError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.uploads
            .lock()
            .unwrap()
            .push((field.to_string(), file.name.clone()));
        let fail = self
            .upload_failures
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(false);

        if let Some(gate) = &self.upload_gate {
            gate.notified().await;
        }

        if fail {
            return Err(ApiError::Status {
                status: 500,
                reason: "Internal Server Error".into(),
                message: None,
            });
        }
        Ok(UploadAcknowledgement {
            original_filename: file.name.clone(),
        })
    }
}

pub fn png(name: &str) -> LocalFile {
    LocalFile::new(name, "image/png", vec![137u8, 80, 78, 71, 13, 10, 26, 10])
}

pub fn pdf(name: &str) -> LocalFile {
    LocalFile::new(name, "application/pdf", vec![37u8, 80, 68, 70])
}
