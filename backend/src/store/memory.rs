//! In-process document store

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError};

/// Documents held in a map; contents are lost on restart
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn put(&self, id: &str, document: &Value) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .insert(id.to_string(), document.clone());
        Ok(())
    }
}
