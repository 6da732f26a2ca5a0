use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::SubmitReviewRequest;
use crate::domain::services::rewards::SubmitReview;
use crate::error::AppError;
use std::sync::Arc;

pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(chalet_id): Path<String>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submitted = state.reward_service.submit_review(&user, SubmitReview {
        chalet_id,
        rating: payload.rating,
        comment: payload.comment,
        group_id: payload.group_id,
    }).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(chalet_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let reviews = state.reward_service.list_reviews(&chalet_id).await?;
    Ok(Json(reviews))
}

pub async fn my_reward_card(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let card = state.reward_service.card_for_traveler(&user).await?;
    Ok(Json(card))
}

pub async fn group_reward_card(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(group_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let card = state.reward_service.card_for_group(&user, &group_id).await?;
    Ok(Json(card))
}
