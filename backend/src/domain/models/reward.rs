use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::RedemptionStatus;

use crate::storage::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub point_cost: u32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl Reward {
    pub fn generate_id() -> String {
        format!("reward::{}", uuid::Uuid::new_v4())
    }
}

impl Document for Reward {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemedReward {
    pub id: String,
    pub family_id: String,
    pub kid_id: String,
    pub kid_name: String,
    pub reward_id: String,
    pub reward_name: String,
    pub points_spent: u32,
    pub date_redeemed: DateTime<Utc>,
    pub status: RedemptionStatus,
    pub date_fulfilled: Option<DateTime<Utc>>,
    pub date_cancelled: Option<DateTime<Utc>>,
    pub cancellation_note: Option<String>,
    pub fulfilled_by: Option<String>,
    pub cancelled_by: Option<String>,
}

impl RedeemedReward {
    pub fn generate_id() -> String {
        format!("redemption::{}", uuid::Uuid::new_v4())
    }

    /// Pending and fulfilled redemptions keep the reward off the kid's list
    pub fn blocks_reward(&self) -> bool {
        matches!(
            self.status,
            RedemptionStatus::PendingFulfillment | RedemptionStatus::Fulfilled
        )
    }
}

impl Document for RedeemedReward {
    fn id(&self) -> &str {
        &self.id
    }
}
