//! Reward program REST API endpoints. Read-only: no handler records a
//! redemption or mutates a profile.

use crate::rest::{ApiError, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use recycle_core::error::RewardsError;
use recycle_core::profile::{MonthlyGoal, RedemptionRecord, UserProfile};
use recycle_rewards::{
    CouponEligibility, LevelEvaluation, ProgressView, QuotaStatus, TierDefinition,
};
use serde::{Deserialize, Serialize};

/// GET /v1/tiers/:user_type/:level: Tier definition for rendering.
pub async fn handle_tier_definition(
    State(state): State<AppState>,
    Path((user_type, level)): Path<(String, String)>,
) -> Result<Json<TierDefinition>, ApiError> {
    let definition = state.engine.tier_definition(&user_type, &level)?;
    metrics::counter!("rewards.api.tier_lookups").increment(1);
    Ok(Json(definition.clone()))
}

/// GET /v1/tiers/:user_type/:level/limit: Monthly coupon quota.
pub async fn handle_monthly_limit(
    State(state): State<AppState>,
    Path((user_type, level)): Path<(String, String)>,
) -> Result<Json<MonthlyLimitResponse>, ApiError> {
    let monthly_limit = state.engine.monthly_limit(&user_type, &level)?;
    Ok(Json(MonthlyLimitResponse { monthly_limit }))
}

/// POST /v1/coupons/eligibility: Quota check for an already counted month.
pub async fn handle_quota(
    State(state): State<AppState>,
    payload: Result<Json<QuotaRequest>, JsonRejection>,
) -> Result<Json<QuotaStatus>, ApiError> {
    let Json(request) = payload?;
    let redeemed_count = request
        .redeemed_count
        .ok_or_else(|| RewardsError::invalid("redeemed_count is required"))?;
    let status = state
        .engine
        .quota(&request.user_type, &request.level, redeemed_count)?;
    metrics::counter!("rewards.api.quota_checks").increment(1);
    Ok(Json(status))
}

/// POST /v1/coupons/eligibility/profile: Count this month's redemptions
/// and evaluate the profile's quota.
pub async fn handle_profile_eligibility(
    State(state): State<AppState>,
    payload: Result<Json<ProfileEligibilityRequest>, JsonRejection>,
) -> Result<Json<CouponEligibility>, ApiError> {
    let Json(request) = payload?;
    let result = state
        .engine
        .eligibility(&request.profile, &request.redemptions)?;
    metrics::counter!("rewards.api.profile_checks").increment(1);
    Ok(Json(result))
}

/// POST /v1/levels/progress: Level gauge and monthly goals.
pub async fn handle_progress(
    State(state): State<AppState>,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> Result<Json<ProgressView>, ApiError> {
    let Json(request) = payload?;
    let view = state
        .engine
        .progress(&request.profile, request.goals.as_deref())?;
    Ok(Json(view))
}

/// POST /v1/levels/evaluate: Whether the profile's points reach a higher level.
pub async fn handle_evaluate_level(
    State(state): State<AppState>,
    payload: Result<Json<LevelRequest>, JsonRejection>,
) -> Result<Json<LevelEvaluation>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.engine.evaluate_level(&request.profile)?))
}

#[derive(Serialize, Deserialize)]
pub struct MonthlyLimitResponse {
    pub monthly_limit: u32,
}

#[derive(Deserialize)]
pub struct QuotaRequest {
    pub user_type: String,
    pub level: String,
    pub redeemed_count: Option<i64>,
}

#[derive(Deserialize)]
pub struct ProfileEligibilityRequest {
    pub profile: UserProfile,
    #[serde(default)]
    pub redemptions: Vec<RedemptionRecord>,
}

#[derive(Deserialize)]
pub struct ProgressRequest {
    pub profile: UserProfile,
    #[serde(default)]
    pub goals: Option<Vec<MonthlyGoal>>,
}

#[derive(Deserialize)]
pub struct LevelRequest {
    pub profile: UserProfile,
}
