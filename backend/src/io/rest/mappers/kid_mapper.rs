use crate::domain::commands::kid::KidCommand;
use crate::domain::models::Kid as DomainKid;
use crate::domain::KidHistory;
use shared::{HistoryPeriod, Kid as SharedKid, KidHistoryResponse, KidListResponse, KidRequest};

use super::RewardMapper;
use super::TaskMapper;

pub struct KidMapper;

impl KidMapper {
    pub fn to_dto(domain: DomainKid) -> SharedKid {
        SharedKid {
            id: domain.id,
            family_id: domain.family_id,
            name: domain.name,
            email: domain.email,
            auth_uid: domain.auth_uid,
            points: domain.points,
            total_earned_points: domain.total_earned_points,
        }
    }

    pub fn to_kid_list_dto(kids: Vec<DomainKid>) -> KidListResponse {
        KidListResponse {
            kids: kids.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_command(request: KidRequest) -> KidCommand {
        KidCommand {
            name: request.name,
            email: request.email,
        }
    }

    pub fn to_history_dto(period: HistoryPeriod, history: KidHistory) -> KidHistoryResponse {
        KidHistoryResponse {
            period,
            completed_tasks: history
                .completed_tasks
                .into_iter()
                .map(TaskMapper::to_completed_dto)
                .collect(),
            redeemed_rewards: history
                .redeemed_rewards
                .into_iter()
                .map(RewardMapper::to_redeemed_dto)
                .collect(),
        }
    }
}
