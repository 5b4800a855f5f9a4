use crate::domain::commands::reward::{FulfillRedemptionResult, RedemptionResult, RewardCommand};
use crate::domain::models::{RedeemedReward as DomainRedeemedReward, Reward as DomainReward};
use shared::{
    CancelRedemptionResponse, FulfillRedemptionResponse, RedeemRewardResponse,
    RedeemedReward as SharedRedeemedReward, RedeemedRewardListResponse, Reward as SharedReward,
    RewardListResponse, RewardRequest,
};

use super::{format_timestamp, KidMapper};

pub struct RewardMapper;

impl RewardMapper {
    pub fn to_dto(domain: DomainReward) -> SharedReward {
        SharedReward {
            id: domain.id,
            family_id: domain.family_id,
            name: domain.name,
            point_cost: domain.point_cost,
            is_available: domain.is_available,
        }
    }

    pub fn to_reward_list_dto(rewards: Vec<DomainReward>) -> RewardListResponse {
        RewardListResponse {
            rewards: rewards.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_command(request: RewardRequest) -> RewardCommand {
        RewardCommand {
            name: request.name,
            point_cost: request.point_cost,
            is_available: request.is_available,
        }
    }

    pub fn to_redeemed_dto(domain: DomainRedeemedReward) -> SharedRedeemedReward {
        SharedRedeemedReward {
            id: domain.id,
            kid_id: domain.kid_id,
            kid_name: domain.kid_name,
            reward_id: domain.reward_id,
            reward_name: domain.reward_name,
            points_spent: domain.points_spent,
            date_redeemed: format_timestamp(domain.date_redeemed),
            status: domain.status,
            date_fulfilled: domain.date_fulfilled.map(format_timestamp),
            date_cancelled: domain.date_cancelled.map(format_timestamp),
            cancellation_note: domain.cancellation_note,
            fulfilled_by: domain.fulfilled_by,
            cancelled_by: domain.cancelled_by,
        }
    }

    pub fn to_redeemed_list_dto(redeemed: Vec<DomainRedeemedReward>) -> RedeemedRewardListResponse {
        RedeemedRewardListResponse {
            redeemed_rewards: redeemed.into_iter().map(Self::to_redeemed_dto).collect(),
        }
    }

    pub fn to_redeem_dto(result: RedemptionResult) -> RedeemRewardResponse {
        RedeemRewardResponse {
            redeemed_reward: Self::to_redeemed_dto(result.redeemed_reward),
            kid: KidMapper::to_dto(result.kid),
        }
    }

    pub fn to_cancel_dto(result: RedemptionResult) -> CancelRedemptionResponse {
        CancelRedemptionResponse {
            redeemed_reward: Self::to_redeemed_dto(result.redeemed_reward),
            kid: KidMapper::to_dto(result.kid),
        }
    }

    pub fn to_fulfill_dto(result: FulfillRedemptionResult) -> FulfillRedemptionResponse {
        FulfillRedemptionResponse {
            redeemed_reward: Self::to_redeemed_dto(result.redeemed_reward),
            relisted_reward: result.relisted_reward.map(Self::to_dto),
        }
    }
}
