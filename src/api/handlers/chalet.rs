use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::{
    requests::{AvailabilityQuery, BlockDatesRequest, CreateChaletRequest},
    responses::AvailabilityResponse,
};
use crate::domain::models::chalet::Chalet;
use crate::domain::services::availability::DateRange;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

pub async fn create_chalet(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateChaletRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !user.is_host() && !user.is_admin() {
        return Err(AppError::Forbidden("Only hosts can register chalets".into()));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Chalet name is required".into()));
    }
    if payload.price_per_night_cents <= 0 {
        return Err(AppError::Validation("Price per night must be positive".into()));
    }
    if payload.cleaning_fee_cents < 0 {
        return Err(AppError::Validation("Cleaning fee cannot be negative".into()));
    }
    if payload.max_guests < 1 {
        return Err(AppError::Validation("A chalet must host at least one guest".into()));
    }

    let chalet = Chalet::new(
        user.user_id.clone(),
        payload.name.trim().to_string(),
        payload.price_per_night_cents,
        payload.cleaning_fee_cents,
        payload.max_guests,
    );
    let created = state.chalet_repo.create(&chalet).await?;
    info!("Chalet {} registered by {}", created.id, user.user_id);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_chalet(
    State(state): State<Arc<AppState>>,
    Path(chalet_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let chalet = state.availability_service.find_chalet(&chalet_id).await?;
    Ok(Json(chalet))
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(chalet_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let booked = state.availability_service.availability(&chalet_id, Utc::now().date_naive()).await?;

    let available = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => {
            let range = DateRange::new(start, end)?;
            let conflicts = state.availability_service.check_overlap(&chalet_id, range, None).await?;
            Some(conflicts.is_empty())
        }
        (None, None) => None,
        _ => return Err(AppError::Validation("start_date and end_date must be given together".into())),
    };

    Ok(Json(AvailabilityResponse { chalet_id, booked, available }))
}

pub async fn block_dates(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(chalet_id): Path<String>,
    Json(payload): Json<BlockDatesRequest>,
) -> Result<impl IntoResponse, AppError> {
    let range = DateRange::new(payload.start_date, payload.end_date)?;
    let block = state.availability_service.create_block(&user, &chalet_id, range, payload.label).await?;
    Ok((StatusCode::CREATED, Json(block)))
}
