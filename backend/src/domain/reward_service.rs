use std::sync::Arc;

use serde_json::json;
use shared::RedemptionStatus;
use tracing::{info, warn};

use crate::storage::{field_value, StoreError, WriteBatch};

use super::approval_service::clean_note;
use super::clock::Clock;
use super::collections::Collections;
use super::commands::reward::{
    CancelRedemptionCommand, FulfillRedemptionCommand, FulfillRedemptionResult,
    RedeemRewardCommand, RedemptionResult, RewardCommand,
};
use super::error::{validate_name, ChoreError, ChoreResult, ValidationError};
use super::models::kid::POINTS_FIELD;
use super::models::{Kid, RedeemedReward, Reward, STATUS_FIELD};
use super::task_service::pending_guard_error;

/// Reward catalogue and the redemption lifecycle
#[derive(Clone)]
pub struct RewardService {
    collections: Collections,
    clock: Arc<dyn Clock>,
}

impl RewardService {
    pub fn new(collections: Collections, clock: Arc<dyn Clock>) -> Self {
        Self { collections, clock }
    }

    pub async fn create_reward(&self, family_id: &str, command: RewardCommand) -> ChoreResult<Reward> {
        info!("Creating reward '{}' in family {}", command.name, family_id);

        if self.collections.families().get(family_id).await?.is_none() {
            return Err(ChoreError::not_found("Family", family_id));
        }
        let (name, point_cost) = validate_reward(&command)?;

        let reward = Reward {
            id: Reward::generate_id(),
            family_id: family_id.to_string(),
            name,
            point_cost,
            is_available: command.is_available,
            created_at: self.clock.now(),
        };
        self.collections.rewards(family_id).save(&reward).await?;

        info!("Created reward {} costing {}", reward.id, reward.point_cost);
        Ok(reward)
    }

    pub async fn update_reward(
        &self,
        family_id: &str,
        reward_id: &str,
        command: RewardCommand,
    ) -> ChoreResult<Reward> {
        info!("Updating reward {} in family {}", reward_id, family_id);

        let mut reward = self.get_reward(family_id, reward_id).await?;
        let (name, point_cost) = validate_reward(&command)?;
        reward.name = name;
        reward.point_cost = point_cost;
        reward.is_available = command.is_available;

        self.collections.rewards(family_id).save(&reward).await?;
        Ok(reward)
    }

    /// Delete a reward definition. Redemptions of it stay as history.
    pub async fn delete_reward(&self, family_id: &str, reward_id: &str) -> ChoreResult<()> {
        info!("Deleting reward {} in family {}", reward_id, family_id);

        let reward = self.get_reward(family_id, reward_id).await?;
        self.collections.rewards(family_id).delete(&reward.id).await?;
        Ok(())
    }

    pub async fn get_reward(&self, family_id: &str, reward_id: &str) -> ChoreResult<Reward> {
        self.collections
            .rewards(family_id)
            .get(reward_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Reward", reward_id))
    }

    /// All rewards, cheapest first
    pub async fn list_rewards(&self, family_id: &str) -> ChoreResult<Vec<Reward>> {
        let mut rewards = self.collections.rewards(family_id).list().await?;
        rewards.sort_by(|a, b| a.point_cost.cmp(&b.point_cost).then_with(|| a.name.cmp(&b.name)));
        Ok(rewards)
    }

    /// Rewards a kid can still redeem: available and not already pending or
    /// fulfilled for this kid. Rewards the kid cannot afford yet are included.
    pub async fn redeemable_rewards(&self, family_id: &str, kid_id: &str) -> ChoreResult<Vec<Reward>> {
        self.get_kid(family_id, kid_id).await?;

        let redemptions = self.redemptions_of(family_id, kid_id).await?;
        let rewards = self
            .list_rewards(family_id)
            .await?
            .into_iter()
            .filter(|r| r.is_available)
            .filter(|r| !redemptions.iter().any(|rr| rr.reward_id == r.id && rr.blocks_reward()))
            .collect();
        Ok(rewards)
    }

    /// Spend points on a reward.
    ///
    /// The balance and already-redeemed checks are repeated inside the write
    /// batch, so racing redemptions can neither take the balance below zero
    /// nor claim the same reward twice.
    pub async fn redeem(&self, command: RedeemRewardCommand) -> ChoreResult<RedemptionResult> {
        info!(
            "Kid {} redeeming reward {} in family {}",
            command.kid_id, command.reward_id, command.family_id
        );

        let family_id = command.family_id.as_str();
        let kid = self.get_kid(family_id, &command.kid_id).await?;
        let reward = self.get_reward(family_id, &command.reward_id).await?;

        if !reward.is_available {
            return Err(ChoreError::Unavailable { reward_id: reward.id });
        }
        let redemptions = self.redemptions_of(family_id, &kid.id).await?;
        if redemptions.iter().any(|rr| rr.reward_id == reward.id && rr.blocks_reward()) {
            return Err(ChoreError::AlreadyRedeemed { reward_id: reward.id });
        }
        if kid.points < u64::from(reward.point_cost) {
            warn!(
                "Kid {} cannot afford reward {}: {} < {}",
                kid.id, reward.id, kid.points, reward.point_cost
            );
            return Err(ChoreError::InsufficientPoints {
                balance: kid.points,
                cost: reward.point_cost,
            });
        }

        let redeemed = RedeemedReward {
            id: RedeemedReward::generate_id(),
            family_id: family_id.to_string(),
            kid_id: kid.id.clone(),
            kid_name: kid.name.clone(),
            reward_id: reward.id.clone(),
            reward_name: reward.name.clone(),
            points_spent: reward.point_cost,
            date_redeemed: self.clock.now(),
            status: RedemptionStatus::PendingFulfillment,
            date_fulfilled: None,
            date_cancelled: None,
            cancellation_note: None,
            fulfilled_by: None,
            cancelled_by: None,
        };

        let kids = self.collections.kids(family_id);
        let kid_path = kids.path(&kid.id);
        let redemptions = self.collections.redeemed_rewards(family_id);
        let redemptions_path = redemptions.collection().to_string();
        let cost = i64::from(reward.point_cost);
        let mut batch = WriteBatch::new();
        batch
            .assert_none_matching(
                redemptions.collection().clone(),
                json!({
                    "kid_id": field_value(&kid.id)?,
                    "reward_id": field_value(&reward.id)?,
                    STATUS_FIELD: [
                        field_value(&RedemptionStatus::PendingFulfillment)?,
                        field_value(&RedemptionStatus::Fulfilled)?,
                    ],
                }),
            )
            .assert_at_least(kid_path.clone(), POINTS_FIELD, cost)
            .increment(kid_path, POINTS_FIELD, -cost);
        redemptions.create_in(&mut batch, &redeemed)?;

        self.collections.commit(batch).await.map_err(|e| match e {
            StoreError::PreconditionFailed { path, .. } if path == redemptions_path => {
                ChoreError::AlreadyRedeemed { reward_id: reward.id.clone() }
            }
            StoreError::PreconditionFailed { .. } => ChoreError::InsufficientPoints {
                balance: kid.points,
                cost: reward.point_cost,
            },
            other => other.into(),
        })?;

        let kid = self.get_kid(family_id, &kid.id).await?;
        info!(
            "Created redemption {}: kid {} -{} points (balance {})",
            redeemed.id, kid.id, redeemed.points_spent, kid.points
        );
        Ok(RedemptionResult { redeemed_reward: redeemed, kid })
    }

    /// Mark a redemption as handed over, optionally re-listing the reward
    pub async fn fulfill(&self, command: FulfillRedemptionCommand) -> ChoreResult<FulfillRedemptionResult> {
        info!(
            "Fulfilling redemption {} in family {} (relist={})",
            command.redeemed_reward_id, command.family_id, command.relist_reward
        );

        let family_id = command.family_id.as_str();
        let redemptions = self.collections.redeemed_rewards(family_id);
        let mut redeemed = self.get_redemption(family_id, &command.redeemed_reward_id).await?;
        require_pending_fulfillment(&redeemed, "fulfill")?;

        redeemed.status = RedemptionStatus::Fulfilled;
        redeemed.date_fulfilled = Some(self.clock.now());
        redeemed.fulfilled_by = Some(command.fulfiller);

        let path = redemptions.path(&redeemed.id);
        let mut batch = WriteBatch::new();
        batch.assert_equals(path, STATUS_FIELD, field_value(&RedemptionStatus::PendingFulfillment)?);
        redemptions.set_in(&mut batch, &redeemed)?;

        let mut relisted_reward = None;
        if command.relist_reward {
            match self.collections.rewards(family_id).get(&redeemed.reward_id).await? {
                Some(original) => {
                    let relisted = Reward {
                        id: Reward::generate_id(),
                        is_available: true,
                        created_at: self.clock.now(),
                        ..original
                    };
                    self.collections.rewards(family_id).create_in(&mut batch, &relisted)?;
                    relisted_reward = Some(relisted);
                }
                None => warn!(
                    "Reward {} no longer exists, nothing to re-list",
                    redeemed.reward_id
                ),
            }
        }

        self.collections
            .commit(batch)
            .await
            .map_err(|e| pending_guard_error(e, &redeemed.id, "fulfill"))?;

        Ok(FulfillRedemptionResult {
            redeemed_reward: redeemed,
            relisted_reward,
        })
    }

    /// Cancel a pending redemption and refund the points spent
    pub async fn cancel(&self, command: CancelRedemptionCommand) -> ChoreResult<RedemptionResult> {
        info!(
            "Cancelling redemption {} in family {}",
            command.redeemed_reward_id, command.family_id
        );

        let family_id = command.family_id.as_str();
        let redemptions = self.collections.redeemed_rewards(family_id);
        let mut redeemed = self.get_redemption(family_id, &command.redeemed_reward_id).await?;
        require_pending_fulfillment(&redeemed, "cancel")?;
        let kid = self.get_kid(family_id, &redeemed.kid_id).await?;

        redeemed.status = RedemptionStatus::CancelledByParent;
        redeemed.date_cancelled = Some(self.clock.now());
        redeemed.cancellation_note = clean_note(command.note);
        redeemed.cancelled_by = Some(command.canceller);

        let path = redemptions.path(&redeemed.id);
        let mut batch = WriteBatch::new();
        batch.assert_equals(path, STATUS_FIELD, field_value(&RedemptionStatus::PendingFulfillment)?);
        redemptions.set_in(&mut batch, &redeemed)?;
        batch.increment(
            self.collections.kids(family_id).path(&kid.id),
            POINTS_FIELD,
            i64::from(redeemed.points_spent),
        );

        self.collections
            .commit(batch)
            .await
            .map_err(|e| pending_guard_error(e, &redeemed.id, "cancel"))?;

        let kid = self.get_kid(family_id, &kid.id).await?;
        info!(
            "Refunded {} points to kid {} (balance {})",
            redeemed.points_spent, kid.id, kid.points
        );
        Ok(RedemptionResult { redeemed_reward: redeemed, kid })
    }

    pub async fn get_redemption(&self, family_id: &str, id: &str) -> ChoreResult<RedeemedReward> {
        self.collections
            .redeemed_rewards(family_id)
            .get(id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Redemption", id))
    }

    /// Redemptions waiting to be fulfilled, oldest first
    pub async fn list_pending_redemptions(&self, family_id: &str) -> ChoreResult<Vec<RedeemedReward>> {
        let mut pending: Vec<RedeemedReward> = self
            .collections
            .redeemed_rewards(family_id)
            .list()
            .await?
            .into_iter()
            .filter(|rr| rr.status == RedemptionStatus::PendingFulfillment)
            .collect();
        pending.sort_by_key(|rr| rr.date_redeemed);
        Ok(pending)
    }

    /// Fulfilled and cancelled redemptions, most recent first
    pub async fn list_processed_redemptions(&self, family_id: &str) -> ChoreResult<Vec<RedeemedReward>> {
        let mut processed: Vec<RedeemedReward> = self
            .collections
            .redeemed_rewards(family_id)
            .list()
            .await?
            .into_iter()
            .filter(|rr| rr.status != RedemptionStatus::PendingFulfillment)
            .collect();
        processed.sort_by_key(|rr| std::cmp::Reverse(rr.date_fulfilled.or(rr.date_cancelled)));
        Ok(processed)
    }

    async fn redemptions_of(&self, family_id: &str, kid_id: &str) -> ChoreResult<Vec<RedeemedReward>> {
        Ok(self
            .collections
            .redeemed_rewards(family_id)
            .list()
            .await?
            .into_iter()
            .filter(|rr| rr.kid_id == kid_id)
            .collect())
    }

    async fn get_kid(&self, family_id: &str, kid_id: &str) -> ChoreResult<Kid> {
        self.collections
            .kids(family_id)
            .get(kid_id)
            .await?
            .ok_or_else(|| ChoreError::not_found("Kid", kid_id))
    }
}

fn validate_reward(command: &RewardCommand) -> Result<(String, u32), ValidationError> {
    let name = validate_name(&command.name)?;
    if command.point_cost == 0 {
        return Err(ValidationError::NonPositiveCost);
    }
    Ok((name, command.point_cost))
}

fn require_pending_fulfillment(redeemed: &RedeemedReward, action: &'static str) -> ChoreResult<()> {
    if redeemed.status == RedemptionStatus::PendingFulfillment {
        Ok(())
    } else {
        Err(ChoreError::InvalidTransition {
            id: redeemed.id.clone(),
            status: redeemed.status.to_string(),
            action,
        })
    }
}
