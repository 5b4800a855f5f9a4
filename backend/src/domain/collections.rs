use std::sync::Arc;

use crate::storage::{DocumentStore, Repository, StorePaths, StoreResult, WriteBatch};

use super::models::{
    CompletedTask, Family, HighscoreGroup, Kid, RedeemedReward, Reward, Task, UserProfile,
};

/// Typed repositories for every collection of one application
#[derive(Clone)]
pub struct Collections {
    store: Arc<dyn DocumentStore>,
    paths: StorePaths,
}

impl Collections {
    pub fn new(store: Arc<dyn DocumentStore>, paths: StorePaths) -> Self {
        Self { store, paths }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        self.store.commit(batch).await
    }

    pub fn users(&self) -> Repository<UserProfile> {
        Repository::new(self.store.clone(), self.paths.users())
    }

    /// First account registered with `email`, compared case-insensitively
    pub async fn user_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>> {
        let users = self.users().list().await?;
        Ok(users
            .into_iter()
            .find(|u| u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email))))
    }

    pub fn families(&self) -> Repository<Family> {
        Repository::new(self.store.clone(), self.paths.families())
    }

    pub fn highscore_groups(&self) -> Repository<HighscoreGroup> {
        Repository::new(self.store.clone(), self.paths.highscore_groups())
    }

    pub fn kids(&self, family_id: &str) -> Repository<Kid> {
        Repository::new(self.store.clone(), self.paths.kids(family_id))
    }

    pub fn tasks(&self, family_id: &str) -> Repository<Task> {
        Repository::new(self.store.clone(), self.paths.tasks(family_id))
    }

    pub fn rewards(&self, family_id: &str) -> Repository<Reward> {
        Repository::new(self.store.clone(), self.paths.rewards(family_id))
    }

    pub fn completed_tasks(&self, family_id: &str) -> Repository<CompletedTask> {
        Repository::new(self.store.clone(), self.paths.completed_tasks(family_id))
    }

    pub fn redeemed_rewards(&self, family_id: &str) -> Repository<RedeemedReward> {
        Repository::new(self.store.clone(), self.paths.redeemed_rewards(family_id))
    }
}
