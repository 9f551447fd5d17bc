//! Locally revocable preview references.
//!
//! A [`PreviewStore`] hands out `blob:` style URLs for in-memory image
//! bytes so a view can display a file before it has been uploaded. Each
//! URL is owned by exactly one [`PreviewHandle`]; dropping the handle
//! revokes the URL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use genstudio_core::media::LocalFile;
use uuid::Uuid;

/// URL scheme prefix of every preview reference.
pub const PREVIEW_URL_PREFIX: &str = "blob:genstudio/";

/// Bytes behind a live preview URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewData {
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

#[derive(Default)]
struct StoreInner {
    entries: HashMap<String, PreviewData>,
    created: u64,
    revoked: u64,
}

/// Registry of live preview URLs. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct PreviewStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `file`'s bytes and return the owning handle.
    pub fn create(&self, file: &LocalFile) -> PreviewHandle {
        let url = format!("{PREVIEW_URL_PREFIX}{}", Uuid::new_v4());
        let mut inner = self.lock();
        inner.entries.insert(
            url.clone(),
            PreviewData {
                mime_type: file.mime_type.clone(),
                bytes: Arc::clone(&file.bytes),
            },
        );
        inner.created += 1;
        drop(inner);

        tracing::debug!(url = %url, file = %file.name, "Created preview");
        PreviewHandle {
            url,
            store: self.clone(),
        }
    }

    /// Look up the bytes behind a preview URL, if it is still live.
    pub fn resolve(&self, url: &str) -> Option<PreviewData> {
        self.lock().entries.get(url).cloned()
    }

    /// Number of preview URLs currently live.
    pub fn live_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Total number of preview URLs ever created.
    pub fn created_count(&self) -> u64 {
        self.lock().created
    }

    /// Total number of preview URLs revoked.
    pub fn revoked_count(&self) -> u64 {
        self.lock().revoked
    }

    fn revoke(&self, url: &str) {
        let mut inner = self.lock();
        if inner.entries.remove(url).is_some() {
            inner.revoked += 1;
            tracing::debug!(url = %url, "Revoked preview");
        } else {
            tracing::warn!(url = %url, "Preview already revoked");
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sole owner of one preview URL. Revokes it on drop.
pub struct PreviewHandle {
    url: String,
    store: PreviewStore,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("url", &self.url)
            .finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}
