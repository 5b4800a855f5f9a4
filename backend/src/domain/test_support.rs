//! Fixtures shared by the service tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use shared::{DayOfWeek, HighscoreScope, RecurrenceType};

use crate::storage::{
    CollectionPath, DbConnection, DocumentPath, DocumentStore, StorePaths, StoreResult,
    Subscription, WriteBatch,
};

use super::clock::{Clock, FixedClock};
use super::collections::Collections;
use super::commands::task::{ApproveTaskCommand, SubmitTaskCommand, TaskCommand};
use super::models::{CompletedTask, Family, Kid, Reward, UserProfile};
use super::task_service::TaskService;

pub const FAMILY_ID: &str = "family-1";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// Monday 2024-01-08
pub fn monday() -> NaiveDate {
    date(2024, 1, 8)
}

pub async fn setup_collections() -> Collections {
    let db = DbConnection::init_test().await.expect("Failed to create test database");
    let store: Arc<dyn DocumentStore> = Arc::new(db);
    Collections::new(store, StorePaths::new("test-app"))
}

type PendingWrite = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Store that runs an armed write right before the next batch it commits,
/// the way another session can slip in between a service's read and write.
pub struct InterleavingStore {
    inner: DbConnection,
    before_commit: Mutex<Option<PendingWrite>>,
}

impl InterleavingStore {
    pub fn arm(&self, write: impl Future<Output = ()> + Send + 'static) {
        *self.before_commit.lock().unwrap() = Some(Box::pin(write));
    }
}

#[async_trait]
impl DocumentStore for InterleavingStore {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Value>> {
        self.inner.get(path).await
    }

    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<Value>> {
        self.inner.list(collection).await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let pending = self.before_commit.lock().unwrap().take();
        if let Some(write) = pending {
            write.await;
        }
        self.inner.commit(batch).await
    }

    fn subscribe(&self, collection: &CollectionPath) -> Subscription {
        self.inner.subscribe(collection)
    }
}

/// Collections over one database: the first writes directly, the second
/// through the returned [`InterleavingStore`]
pub async fn setup_interleaved() -> (Collections, Collections, Arc<InterleavingStore>) {
    let db = DbConnection::init_test().await.expect("Failed to create test database");
    let interleaving = Arc::new(InterleavingStore {
        inner: db.clone(),
        before_commit: Mutex::new(None),
    });
    let direct = Collections::new(Arc::new(db), StorePaths::new("test-app"));
    let store: Arc<dyn DocumentStore> = interleaving.clone();
    let through = Collections::new(store, StorePaths::new("test-app"));
    (direct, through, interleaving)
}

pub fn clock_on(day: NaiveDate) -> Arc<dyn Clock> {
    Arc::new(FixedClock::on(day))
}

pub async fn seed_family(collections: &Collections, id: &str, name: &str) -> Family {
    let family = Family {
        id: id.to_string(),
        name: name.to_string(),
        highscore_scope: HighscoreScope::Internal,
        highscore_group_id: None,
        created_at: chrono::Utc::now(),
    };
    collections.families().save(&family).await.expect("seed family");
    family
}

pub async fn seed_kid(collections: &Collections, family_id: &str, id: &str, points: u64) -> Kid {
    let kid = Kid {
        id: id.to_string(),
        family_id: family_id.to_string(),
        name: format!("Kid {}", id),
        email: None,
        auth_uid: None,
        points,
        total_earned_points: points,
        created_at: chrono::Utc::now(),
    };
    collections.kids(family_id).save(&kid).await.expect("seed kid");
    kid
}

pub async fn seed_reward(collections: &Collections, family_id: &str, id: &str, cost: u32) -> Reward {
    let reward = Reward {
        id: id.to_string(),
        family_id: family_id.to_string(),
        name: format!("Reward {}", id),
        point_cost: cost,
        is_available: true,
        created_at: chrono::Utc::now(),
    };
    collections.rewards(family_id).save(&reward).await.expect("seed reward");
    reward
}

pub async fn seed_user(collections: &Collections, uid: &str, email: &str) -> UserProfile {
    let user = UserProfile {
        uid: uid.to_string(),
        email: Some(email.to_string()),
        display_name: None,
        is_system_admin: false,
        family_roles: Vec::new(),
        active_family_role: None,
        created_at: chrono::Utc::now(),
        last_login_at: chrono::Utc::now(),
    };
    collections.users().save(&user).await.expect("seed user");
    user
}

pub fn task_command(recurrence_type: RecurrenceType, start: &str, due: Option<&str>) -> TaskCommand {
    TaskCommand {
        name: "Make the bed".to_string(),
        points: 5,
        recurrence_type,
        days_of_week: if recurrence_type == RecurrenceType::Weekly {
            vec![DayOfWeek::Mon, DayOfWeek::Wed]
        } else {
            Vec::new()
        },
        start_date: Some(start.to_string()),
        custom_due_date: due.map(str::to_string),
        assigned_kid_id: None,
    }
}

/// A 5-point daily task submitted by `kid_id` for Monday, waiting for approval
pub async fn pending_daily_submission(collections: &Collections, kid_id: &str) -> CompletedTask {
    let tasks = TaskService::new(collections.clone(), clock_on(monday()));
    let task = tasks
        .create_task(FAMILY_ID, task_command(RecurrenceType::Daily, "2024-01-08", None))
        .await
        .expect("seed task");
    tasks
        .submit_task(SubmitTaskCommand {
            family_id: FAMILY_ID.to_string(),
            kid_id: kid_id.to_string(),
            task_id: task.id,
        })
        .await
        .expect("seed submission")
}

pub fn approve_command(completed_task_id: &str) -> ApproveTaskCommand {
    ApproveTaskCommand {
        family_id: FAMILY_ID.to_string(),
        completed_task_id: completed_task_id.to_string(),
        points_awarded: None,
        note: None,
        approver: "Parent".to_string(),
    }
}
