//! # Storage Traits
//!
//! The domain layer talks to persistence only through [`DocumentStore`]: a
//! document database with collection reads, atomic write batches and live
//! change subscriptions.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

use super::batch::WriteBatch;
use super::error::StoreResult;
use super::paths::{CollectionPath, DocumentPath};

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    Upserted(Value),
    Deleted,
}

/// Published once per written document after a batch commits
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub path: DocumentPath,
    pub kind: ChangeKind,
}

/// Live feed of changes to a single collection
pub struct Subscription {
    collection: CollectionPath,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn new(collection: CollectionPath, receiver: broadcast::Receiver<ChangeEvent>) -> Self {
        Self { collection, receiver }
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Wait for the next change in the subscribed collection.
    /// Returns `None` once the store has been dropped.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.path.collection == self.collection => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "Subscription to {} lagged, {} change events skipped",
                        self.collection, skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Trait defining the interface for the document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Value>>;

    /// Read every document of a collection, ordered by id
    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<Value>>;

    /// Apply all operations of the batch atomically
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Subscribe to changes committed after this call
    fn subscribe(&self, collection: &CollectionPath) -> Subscription;

    async fn set(&self, path: &DocumentPath, data: Value) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.set(path.clone(), data);
        self.commit(batch).await
    }

    async fn update(&self, path: &DocumentPath, fields: Value) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.update(path.clone(), fields);
        self.commit(batch).await
    }

    async fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(path.clone());
        self.commit(batch).await
    }
}
