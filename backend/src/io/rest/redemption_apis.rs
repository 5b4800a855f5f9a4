//! # REST API for Reward Redemptions
//!
//! Parents work through pending redemptions by fulfilling or cancelling them.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use shared::{
    CancelRedemptionRequest, CancelRedemptionResponse, FulfillRedemptionRequest,
    FulfillRedemptionResponse, RedeemedRewardListResponse,
};
use tracing::info;

use super::mappers::RewardMapper;
use super::{current_actor, ApiResult};
use crate::domain::commands::reward::{CancelRedemptionCommand, FulfillRedemptionCommand};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(list_pending))
        .route("/processed", get(list_processed))
        .route("/:redeemed_reward_id/fulfill", post(fulfill_redemption))
        .route("/:redeemed_reward_id/cancel", post(cancel_redemption))
}

pub async fn list_pending(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
) -> ApiResult<Json<RedeemedRewardListResponse>> {
    info!("GET /api/families/{}/redemptions/pending", family_id);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    let pending = state
        .reward_service
        .list_pending_redemptions(&family_id)
        .await?;
    Ok(Json(RewardMapper::to_redeemed_list_dto(pending)))
}

pub async fn list_processed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
) -> ApiResult<Json<RedeemedRewardListResponse>> {
    info!("GET /api/families/{}/redemptions/processed", family_id);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    let processed = state
        .reward_service
        .list_processed_redemptions(&family_id)
        .await?;
    Ok(Json(RewardMapper::to_redeemed_list_dto(processed)))
}

pub async fn fulfill_redemption(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, redeemed_reward_id)): Path<(String, String)>,
    Json(request): Json<FulfillRedemptionRequest>,
) -> ApiResult<Json<FulfillRedemptionResponse>> {
    info!(
        "POST /api/families/{}/redemptions/{}/fulfill - relist: {}",
        family_id, redeemed_reward_id, request.relist_reward
    );

    let actor = current_actor(&state, &headers).await?;
    actor.require_parent(&family_id)?;

    let command = FulfillRedemptionCommand {
        family_id,
        redeemed_reward_id,
        relist_reward: request.relist_reward,
        fulfiller: actor.uid().to_string(),
    };
    let result = state.reward_service.fulfill(command).await?;
    Ok(Json(RewardMapper::to_fulfill_dto(result)))
}

pub async fn cancel_redemption(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, redeemed_reward_id)): Path<(String, String)>,
    Json(request): Json<CancelRedemptionRequest>,
) -> ApiResult<Json<CancelRedemptionResponse>> {
    info!(
        "POST /api/families/{}/redemptions/{}/cancel - request: {:?}",
        family_id, redeemed_reward_id, request
    );

    let actor = current_actor(&state, &headers).await?;
    actor.require_parent(&family_id)?;

    let command = CancelRedemptionCommand {
        family_id,
        redeemed_reward_id,
        note: request.note,
        canceller: actor.uid().to_string(),
    };
    let result = state.reward_service.cancel(command).await?;
    Ok(Json(RewardMapper::to_cancel_dto(result)))
}
