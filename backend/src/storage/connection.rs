use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use super::batch::{WriteBatch, WriteOp};
use super::error::{StoreError, StoreResult};
use super::paths::{CollectionPath, DocumentPath};
use super::traits::{ChangeEvent, ChangeKind, DocumentStore, Subscription};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// SQLite backed document store.
///
/// Every document is a JSON object stored under `(collection, id)`. Batches
/// run inside one SQLite transaction and are serialized by a commit lock, so
/// preconditions observe the state the batch's writes are applied to.
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
    commit_lock: Arc<Mutex<()>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl DbConnection {
    /// Open (creating if needed) the database at `url`
    pub async fn new(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        info!("Connected to document database at {}", url);
        Self::from_pool(pool).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> StoreResult<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);
        let options = SqliteConnectOptions::from_str(&db_url)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        Self::setup_schema(&pool).await?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            pool: Arc::new(pool),
            commit_lock: Arc::new(Mutex::new(())),
            changes,
        })
    }

    async fn setup_schema(pool: &SqlitePool) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn read_doc(
        tx: &mut Transaction<'_, Sqlite>,
        path: &DocumentPath,
    ) -> StoreResult<Option<Value>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(path.collection.as_str())
            .bind(&path.id)
            .fetch_optional(&mut **tx)
            .await?;

        match row {
            Some(r) => {
                let data: String = r.get("data");
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn require_doc(
        tx: &mut Transaction<'_, Sqlite>,
        path: &DocumentPath,
    ) -> StoreResult<Value> {
        Self::read_doc(tx, path)
            .await?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn write_doc(
        tx: &mut Transaction<'_, Sqlite>,
        path: &DocumentPath,
        data: &Value,
    ) -> StoreResult<()> {
        if !data.is_object() {
            return Err(StoreError::PreconditionFailed {
                path: path.to_string(),
                reason: "document data must be a JSON object".to_string(),
            });
        }

        sqlx::query(
            "INSERT OR REPLACE INTO documents (collection, id, data, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(path.collection.as_str())
        .bind(&path.id)
        .bind(serde_json::to_string(data)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    fn integer_field(doc: &Value, field: &str, path: &DocumentPath) -> StoreResult<i64> {
        match doc.get(field) {
            None | Some(Value::Null) => Ok(0),
            Some(value) => value.as_i64().ok_or_else(|| StoreError::PreconditionFailed {
                path: path.to_string(),
                reason: format!("field '{}' is not an integer", field),
            }),
        }
    }

    /// Apply one operation inside the open transaction, returning the change
    /// to publish once the transaction commits.
    async fn apply_op(
        tx: &mut Transaction<'_, Sqlite>,
        op: WriteOp,
    ) -> StoreResult<Option<ChangeEvent>> {
        match op {
            WriteOp::Set { path, data } => {
                Self::write_doc(tx, &path, &data).await?;
                Ok(Some(ChangeEvent { path, kind: ChangeKind::Upserted(data) }))
            }
            WriteOp::Create { path, data } => {
                if Self::read_doc(tx, &path).await?.is_some() {
                    return Err(StoreError::AlreadyExists(path.to_string()));
                }
                Self::write_doc(tx, &path, &data).await?;
                Ok(Some(ChangeEvent { path, kind: ChangeKind::Upserted(data) }))
            }
            WriteOp::Update { path, fields } => {
                let mut doc = Self::require_doc(tx, &path).await?;
                let Value::Object(fields) = fields else {
                    return Err(StoreError::PreconditionFailed {
                        path: path.to_string(),
                        reason: "update fields must be a JSON object".to_string(),
                    });
                };
                if let Value::Object(existing) = &mut doc {
                    for (key, value) in fields {
                        existing.insert(key, value);
                    }
                }
                Self::write_doc(tx, &path, &doc).await?;
                Ok(Some(ChangeEvent { path, kind: ChangeKind::Upserted(doc) }))
            }
            WriteOp::Increment { path, field, delta } => {
                let mut doc = Self::require_doc(tx, &path).await?;
                let current = Self::integer_field(&doc, &field, &path)?;
                let next = current
                    .checked_add(delta)
                    .filter(|value| *value >= 0)
                    .ok_or_else(|| StoreError::PreconditionFailed {
                        path: path.to_string(),
                        reason: format!("field '{}' would drop below zero", field),
                    })?;
                if let Value::Object(existing) = &mut doc {
                    existing.insert(field, Value::from(next));
                }
                Self::write_doc(tx, &path, &doc).await?;
                Ok(Some(ChangeEvent { path, kind: ChangeKind::Upserted(doc) }))
            }
            WriteOp::Delete { path } => {
                let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                    .bind(path.collection.as_str())
                    .bind(&path.id)
                    .execute(&mut **tx)
                    .await?;
                if result.rows_affected() > 0 {
                    Ok(Some(ChangeEvent { path, kind: ChangeKind::Deleted }))
                } else {
                    Ok(None)
                }
            }
            WriteOp::AssertAtLeast { path, field, min } => {
                let doc = Self::require_doc(tx, &path).await?;
                let current = Self::integer_field(&doc, &field, &path)?;
                if current < min {
                    return Err(StoreError::PreconditionFailed {
                        path: path.to_string(),
                        reason: format!("field '{}' is {}, expected at least {}", field, current, min),
                    });
                }
                Ok(None)
            }
            WriteOp::AssertEquals { path, field, value } => {
                let doc = Self::require_doc(tx, &path).await?;
                if doc.get(&field) != Some(&value) {
                    return Err(StoreError::PreconditionFailed {
                        path: path.to_string(),
                        reason: format!("field '{}' does not equal {}", field, value),
                    });
                }
                Ok(None)
            }
            WriteOp::AssertNoneMatching { collection, filter } => {
                let Value::Object(filter) = filter else {
                    return Err(StoreError::PreconditionFailed {
                        path: collection.to_string(),
                        reason: "filter must be a JSON object".to_string(),
                    });
                };
                let rows = sqlx::query("SELECT id, data FROM documents WHERE collection = ?")
                    .bind(collection.as_str())
                    .fetch_all(&mut **tx)
                    .await?;
                for row in rows {
                    let data: String = row.get("data");
                    let doc: Value = serde_json::from_str(&data)?;
                    if Self::matches_filter(&doc, &filter) {
                        let id: String = row.get("id");
                        return Err(StoreError::PreconditionFailed {
                            path: collection.to_string(),
                            reason: format!("document '{}' matches the filter", id),
                        });
                    }
                }
                Ok(None)
            }
        }
    }

    fn matches_filter(doc: &Value, filter: &serde_json::Map<String, Value>) -> bool {
        filter.iter().all(|(field, expected)| {
            let actual = doc.get(field).unwrap_or(&Value::Null);
            match expected {
                Value::Array(options) => options.contains(actual),
                _ => actual == expected,
            }
        })
    }
}

#[async_trait]
impl DocumentStore for DbConnection {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Value>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(path.collection.as_str())
            .bind(&path.id)
            .fetch_optional(&*self.pool)
            .await?;

        match row {
            Some(r) => {
                let data: String = r.get("data");
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<Value>> {
        let rows = sqlx::query("SELECT data FROM documents WHERE collection = ? ORDER BY id")
            .bind(collection.as_str())
            .fetch_all(&*self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let data: String = row.get("data");
                serde_json::from_str(&data).map_err(StoreError::from)
            })
            .collect()
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let op_count = batch.len();
        let events = {
            let _guard = self.commit_lock.lock().await;
            let mut tx = self.pool.begin().await?;
            let mut events = Vec::with_capacity(op_count);
            for op in batch.into_ops() {
                // An early return drops the transaction, rolling it back
                if let Some(event) = Self::apply_op(&mut tx, op).await? {
                    events.push(event);
                }
            }
            tx.commit().await?;
            events
        };

        debug!("Committed batch of {} operations", op_count);
        for event in events {
            // No receivers is fine
            let _ = self.changes.send(event);
        }
        Ok(())
    }

    fn subscribe(&self, collection: &CollectionPath) -> Subscription {
        Subscription::new(collection.clone(), self.changes.subscribe())
    }
}
