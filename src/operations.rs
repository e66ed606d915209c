//! Entity Operations
//!
//! This module implements the list / get / create / update / delete calls
//! shared by every entity collection.

use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::Method;
use tracing::info;

use crate::errors::{ApiError, Result};
use crate::models::{DeleteOutcome, Entity};
use crate::transport::Transport;
use crate::types::DATA_PREFIX;

/// CRUD handle for one entity collection
///
/// Handles are cheap to clone and share the client's transport.
pub struct EntityApi<E: Entity> {
    transport: Arc<Transport>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for EntityApi<E> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> EntityApi<E> {
    /// Creates a handle over a transport
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self {
            transport,
            _entity: PhantomData,
        }
    }

    /// Lists every record of the collection
    pub async fn list(&self) -> Result<Vec<E>> {
        let url = self.transport.endpoint(&[DATA_PREFIX, E::COLLECTION])?;
        self.transport.request_json(Method::GET, url, None::<&()>).await
    }

    /// Fetches one record
    pub async fn get_by_id(&self, id: &str) -> Result<E> {
        let url = self.record_url(id)?;
        self.transport.request_json(Method::GET, url, None::<&()>).await
    }

    /// Creates a record and returns it as stored
    pub async fn create(&self, draft: &E::Draft) -> Result<E> {
        let url = self.transport.endpoint(&[DATA_PREFIX, E::COLLECTION])?;
        let created: E = self.transport.request_json(Method::POST, url, Some(draft)).await?;
        info!(collection = E::COLLECTION, id = created.id(), "record created");
        Ok(created)
    }

    /// Applies a partial update and returns the record as stored
    pub async fn update(&self, id: &str, patch: &E::Patch) -> Result<E> {
        let url = self.record_url(id)?;
        let updated = self.transport.request_json(Method::PUT, url, Some(patch)).await?;
        info!(collection = E::COLLECTION, id, "record updated");
        Ok(updated)
    }

    /// Deletes a record
    ///
    /// An empty success body counts as `{success: true}`.
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome> {
        let url = self.record_url(id)?;
        let body = self
            .transport
            .request_bytes(Method::DELETE, url, None::<&()>)
            .await?;
        let outcome = if body.iter().all(u8::is_ascii_whitespace) {
            DeleteOutcome { success: true }
        } else {
            serde_json::from_slice(&body)?
        };
        info!(collection = E::COLLECTION, id, success = outcome.success, "record deleted");
        Ok(outcome)
    }

    fn record_url(&self, id: &str) -> Result<url::Url> {
        let id = validate_id(id)?;
        self.transport.endpoint(&[DATA_PREFIX, E::COLLECTION, id])
    }
}

/// Rejects identifiers that would change the route shape
pub fn validate_id(id: &str) -> Result<&str> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed.contains('/') {
        return Err(ApiError::InvalidArgument(format!("Invalid record id: {:?}", id)));
    }
    Ok(trimmed)
}
