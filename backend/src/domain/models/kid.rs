use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Document;

/// Document field holding the redeemable balance
pub const POINTS_FIELD: &str = "points";
/// Document field holding the lifetime earned counter
pub const TOTAL_EARNED_FIELD: &str = "total_earned_points";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kid {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub email: Option<String>,
    /// Identity-provider uid of the kid's own account, once linked
    pub auth_uid: Option<String>,
    pub points: u64,
    pub total_earned_points: u64,
    pub created_at: DateTime<Utc>,
}

impl Kid {
    pub fn generate_id() -> String {
        format!("kid::{}", uuid::Uuid::new_v4())
    }
}

impl Document for Kid {
    fn id(&self) -> &str {
        &self.id
    }
}
