//! Blobs and Object URLs
//!
//! An assembled report lives in memory as a [`Blob`]. Views hand out a
//! short [`ObjectUrl`] instead of the bytes; the registry resolves it until
//! the owner revokes it.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tracing::debug;

use crate::errors::Result;

const OBJECT_URL_SCHEME: &str = "blob:hospital-admin/";

/// An immutable binary payload with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
    content_type: String,
}

impl Blob {
    /// Wraps a payload
    pub fn new(data: Bytes, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
        }
    }

    /// Payload bytes
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// MIME type of the payload
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true for an empty payload
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Writes the payload to the local filesystem
    pub async fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        tokio::fs::write(path.as_ref(), &self.data).await?;
        Ok(())
    }
}

/// Opaque reference to a blob held by an [`ObjectUrlRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    /// The URL text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds blobs behind object URLs
///
/// Cloning the registry yields another handle to the same store.
#[derive(Debug, Clone, Default)]
pub struct ObjectUrlRegistry {
    entries: Arc<Mutex<HashMap<ObjectUrl, Blob>>>,
    next_id: Arc<AtomicU64>,
}

impl ObjectUrlRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a blob and returns a fresh URL for it
    pub fn create(&self, blob: Blob) -> ObjectUrl {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let url = ObjectUrl(format!("{}{}", OBJECT_URL_SCHEME, id));
        debug!(url = %url, size = blob.len(), "object URL created");
        self.lock().insert(url.clone(), blob);
        url
    }

    /// Looks up the blob behind a URL
    pub fn resolve(&self, url: &ObjectUrl) -> Option<Blob> {
        self.lock().get(url).cloned()
    }

    /// Releases a URL
    ///
    /// Returns false when the URL was unknown or already revoked.
    pub fn revoke(&self, url: &ObjectUrl) -> bool {
        let removed = self.lock().remove(url).is_some();
        if removed {
            debug!(url = %url, "object URL revoked");
        }
        removed
    }

    /// Number of live URLs
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when no URL is live
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ObjectUrl, Blob>> {
        // The map stays consistent even if a holder panicked.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
