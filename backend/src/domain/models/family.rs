use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::HighscoreScope;

use crate::storage::Document;

/// A household: the tenancy boundary that owns kids, tasks and rewards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: String,
    pub name: String,
    pub highscore_scope: HighscoreScope,
    pub highscore_group_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Family {
    pub fn generate_id() -> String {
        format!("family::{}", uuid::Uuid::new_v4())
    }

    /// Name given to the family created for an administrator on first sign-in
    pub fn default_name_for(owner: &str) -> String {
        format!("{}'s Default Family", owner)
    }
}

impl Document for Family {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Administrator-defined set of families sharing a leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighscoreGroup {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl HighscoreGroup {
    pub fn generate_id() -> String {
        format!("group::{}", uuid::Uuid::new_v4())
    }
}

impl Document for HighscoreGroup {
    fn id(&self) -> &str {
        &self.id
    }
}
