use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::batch::WriteBatch;
use super::error::StoreResult;
use super::paths::{CollectionPath, DocumentPath};
use super::traits::{DocumentStore, Subscription};

/// A typed document that carries its own id
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    fn id(&self) -> &str;
}

/// Typed view of one collection
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    collection: CollectionPath,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>, collection: CollectionPath) -> Self {
        Self {
            store,
            collection,
            _marker: PhantomData,
        }
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn path(&self, id: &str) -> DocumentPath {
        self.collection.doc(id)
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<T>> {
        match self.store.get(&self.path(id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// List the collection. Documents that no longer decode are skipped so a
    /// single bad record does not take the whole view down.
    pub async fn list(&self) -> StoreResult<Vec<T>> {
        let values = self.store.list(&self.collection).await?;
        let mut items = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<T>(value) {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping unreadable document in {}: {}", self.collection, e),
            }
        }
        Ok(items)
    }

    pub async fn save(&self, item: &T) -> StoreResult<()> {
        self.store.set(&self.path(item.id()), serde_json::to_value(item)?).await
    }

    /// Merge a single top-level field into an existing document
    pub async fn update_field(&self, id: &str, field: &str, value: Value) -> StoreResult<()> {
        let mut fields = serde_json::Map::new();
        fields.insert(field.to_string(), value);
        self.store.update(&self.path(id), Value::Object(fields)).await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(&self.path(id)).await
    }

    pub fn subscribe(&self) -> Subscription {
        self.store.subscribe(&self.collection)
    }

    /// Queue a full write of `item` into `batch`
    pub fn set_in(&self, batch: &mut WriteBatch, item: &T) -> StoreResult<()> {
        batch.set(self.path(item.id()), serde_json::to_value(item)?);
        Ok(())
    }

    /// Queue a write of `item` that fails if the document already exists
    pub fn create_in(&self, batch: &mut WriteBatch, item: &T) -> StoreResult<()> {
        batch.create(self.path(item.id()), serde_json::to_value(item)?);
        Ok(())
    }
}

/// Serialize a single field value the way it is stored in documents
pub fn field_value<V: Serialize>(value: &V) -> StoreResult<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DbConnection;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        text: String,
    }

    impl Document for Note {
        fn id(&self) -> &str {
            &self.id
        }
    }

    async fn setup_test() -> (Arc<dyn DocumentStore>, Repository<Note>) {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let store: Arc<dyn DocumentStore> = Arc::new(db);
        let repo = Repository::new(store.clone(), CollectionPath::new("notes"));
        (store, repo)
    }

    #[tokio::test]
    async fn test_save_get_delete() {
        let (_, repo) = setup_test().await;
        let note = Note { id: "n1".to_string(), text: "hello".to_string() };

        repo.save(&note).await.unwrap();
        assert_eq!(repo.get("n1").await.unwrap(), Some(note));

        repo.delete("n1").await.unwrap();
        assert_eq!(repo.get("n1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_skips_unreadable_documents() {
        let (store, repo) = setup_test().await;
        repo.save(&Note { id: "a".to_string(), text: "ok".to_string() }).await.unwrap();
        store.set(&repo.path("b"), json!({"id": "b", "text": 42})).await.unwrap();

        let notes = repo.list().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "a");
    }
}
