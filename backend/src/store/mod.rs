//! Document storage for the district cache
//!
//! The cache is a flat key-value collection of JSON documents: one per
//! district id plus the refresh cursor. Nothing beyond point lookups and
//! last-write-wins upserts is required from a backend.

mod memory;
mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use shared::{CursorDocument, DistrictDocument, CURSOR_DOCUMENT_ID};
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Point get/put access to JSON documents keyed by id
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError>;

    async fn put(&self, id: &str, document: &Value) -> Result<(), StoreError>;

    /// Connectivity probe for health checks
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Typed access to district and cursor documents
#[derive(Clone)]
pub struct DistrictCache {
    store: Arc<dyn DocumentStore>,
}

impl DistrictCache {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Cached document for a district. Missing or malformed documents read
    /// as `None`.
    pub async fn district(&self, id: &str) -> Result<Option<DistrictDocument>, StoreError> {
        let Some(value) = self.store.get(id).await? else {
            tracing::debug!("No cached document for district {}", id);
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(document) => Ok(Some(document)),
            Err(e) => {
                tracing::warn!("Ignoring malformed document for district {}: {}", id, e);
                Ok(None)
            }
        }
    }

    pub async fn put_district(&self, document: &DistrictDocument) -> Result<(), StoreError> {
        let value = serde_json::to_value(document)?;
        self.store.put(&document.id, &value).await?;
        tracing::info!("Document written successfully with ID '{}'", document.id);
        Ok(())
    }

    /// Persisted refresh cursor, if any
    pub async fn cursor(&self) -> Result<Option<u32>, StoreError> {
        let Some(value) = self.store.get(CURSOR_DOCUMENT_ID).await? else {
            return Ok(None);
        };

        match serde_json::from_value::<CursorDocument>(value) {
            Ok(cursor) => Ok(Some(cursor.district_number)),
            Err(e) => {
                tracing::warn!("Ignoring malformed cursor document: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn put_cursor(&self, district_number: u32) -> Result<(), StoreError> {
        let value = serde_json::to_value(CursorDocument { district_number })?;
        self.store.put(CURSOR_DOCUMENT_ID, &value).await
    }
}
