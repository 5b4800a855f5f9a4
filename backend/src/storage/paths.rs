//! Document path layout.
//!
//! Global collections live under `artifacts/{app_id}/{collection}` and
//! family-owned collections under
//! `artifacts/{app_id}/families/{family_id}/{collection}`.

use std::fmt;

pub const USERS: &str = "users";
pub const FAMILIES: &str = "families";
pub const HIGHSCORE_GROUPS: &str = "highscoreGroups";
pub const KIDS: &str = "kids";
pub const TASKS: &str = "tasks";
pub const REWARDS: &str = "rewards";
pub const COMPLETED_TASKS: &str = "completedTasks";
pub const REDEEMED_REWARDS: &str = "redeemedRewards";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn doc(&self, id: &str) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.to_string(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    pub collection: CollectionPath,
    pub id: String,
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Resolves collection paths for one application id
#[derive(Debug, Clone)]
pub struct StorePaths {
    app_id: String,
}

impl StorePaths {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self { app_id: app_id.into() }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    fn global(&self, collection: &str) -> CollectionPath {
        CollectionPath(format!("artifacts/{}/{}", self.app_id, collection))
    }

    fn family_scoped(&self, family_id: &str, collection: &str) -> CollectionPath {
        CollectionPath(format!(
            "artifacts/{}/{}/{}/{}",
            self.app_id, FAMILIES, family_id, collection
        ))
    }

    pub fn users(&self) -> CollectionPath {
        self.global(USERS)
    }

    pub fn families(&self) -> CollectionPath {
        self.global(FAMILIES)
    }

    pub fn highscore_groups(&self) -> CollectionPath {
        self.global(HIGHSCORE_GROUPS)
    }

    pub fn kids(&self, family_id: &str) -> CollectionPath {
        self.family_scoped(family_id, KIDS)
    }

    pub fn tasks(&self, family_id: &str) -> CollectionPath {
        self.family_scoped(family_id, TASKS)
    }

    pub fn rewards(&self, family_id: &str) -> CollectionPath {
        self.family_scoped(family_id, REWARDS)
    }

    pub fn completed_tasks(&self, family_id: &str) -> CollectionPath {
        self.family_scoped(family_id, COMPLETED_TASKS)
    }

    pub fn redeemed_rewards(&self, family_id: &str) -> CollectionPath {
        self.family_scoped(family_id, REDEEMED_REWARDS)
    }
}
