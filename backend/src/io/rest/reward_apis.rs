//! # REST API for Rewards
//!
//! Reward catalogue maintained by parents, and redemption by kids.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use shared::{RedeemRewardRequest, RedeemRewardResponse, Reward, RewardListResponse, RewardRequest};
use tracing::info;

use super::kid_apis::accessible_kid;
use super::mappers::RewardMapper;
use super::{current_actor, ApiResult};
use crate::domain::commands::reward::RedeemRewardCommand;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rewards).post(create_reward))
        .route(
            "/:reward_id",
            get(get_reward).put(update_reward).delete(delete_reward),
        )
        .route("/:reward_id/redeem", post(redeem_reward))
}

pub async fn list_rewards(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
) -> ApiResult<Json<RewardListResponse>> {
    info!("GET /api/families/{}/rewards", family_id);

    current_actor(&state, &headers).await?.require_member(&family_id)?;
    let rewards = state.reward_service.list_rewards(&family_id).await?;
    Ok(Json(RewardMapper::to_reward_list_dto(rewards)))
}

pub async fn create_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
    Json(request): Json<RewardRequest>,
) -> ApiResult<(StatusCode, Json<Reward>)> {
    info!("POST /api/families/{}/rewards - request: {:?}", family_id, request);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    let reward = state
        .reward_service
        .create_reward(&family_id, RewardMapper::to_command(request))
        .await?;
    Ok((StatusCode::CREATED, Json(RewardMapper::to_dto(reward))))
}

pub async fn get_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, reward_id)): Path<(String, String)>,
) -> ApiResult<Json<Reward>> {
    info!("GET /api/families/{}/rewards/{}", family_id, reward_id);

    current_actor(&state, &headers).await?.require_member(&family_id)?;
    let reward = state.reward_service.get_reward(&family_id, &reward_id).await?;
    Ok(Json(RewardMapper::to_dto(reward)))
}

pub async fn update_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, reward_id)): Path<(String, String)>,
    Json(request): Json<RewardRequest>,
) -> ApiResult<Json<Reward>> {
    info!("PUT /api/families/{}/rewards/{} - request: {:?}", family_id, reward_id, request);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    let reward = state
        .reward_service
        .update_reward(&family_id, &reward_id, RewardMapper::to_command(request))
        .await?;
    Ok(Json(RewardMapper::to_dto(reward)))
}

pub async fn delete_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, reward_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    info!("DELETE /api/families/{}/rewards/{}", family_id, reward_id);

    current_actor(&state, &headers).await?.require_parent(&family_id)?;
    state.reward_service.delete_reward(&family_id, &reward_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn redeem_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((family_id, reward_id)): Path<(String, String)>,
    Json(request): Json<RedeemRewardRequest>,
) -> ApiResult<(StatusCode, Json<RedeemRewardResponse>)> {
    info!(
        "POST /api/families/{}/rewards/{}/redeem - kid: {}",
        family_id, reward_id, request.kid_id
    );

    let actor = current_actor(&state, &headers).await?;
    accessible_kid(&state, &actor, &family_id, &request.kid_id).await?;

    let command = RedeemRewardCommand {
        family_id,
        kid_id: request.kid_id,
        reward_id,
    };
    let result = state.reward_service.redeem(command).await?;
    Ok((StatusCode::CREATED, Json(RewardMapper::to_redeem_dto(result))))
}
