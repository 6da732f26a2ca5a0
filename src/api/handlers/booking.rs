use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, maybe_auth::MaybeAuthUser};
use crate::api::dtos::requests::CreateBookingRequest;
use crate::domain::services::booking_service::CreateBooking;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(chalet_id): Path<String>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    info!(
        "create_booking: chalet {} from {} to {} ({})",
        chalet_id,
        payload.start_date,
        payload.end_date,
        if user.is_some() { "authenticated" } else { "guest" }
    );

    let view = state.booking_service.create(CreateBooking {
        chalet_id,
        actor: user,
        start_date: payload.start_date,
        end_date: payload.end_date,
        guest_name: payload.guest_name,
        guest_email: payload.guest_email,
        guest_phone: payload.guest_phone,
        guest_count: payload.guest_count,
        coupon_code: payload.coupon_code,
        flow: payload.flow,
    }).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.booking_service.get(&user, &booking_id).await?;
    Ok(Json(view))
}

pub async fn approve_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service.approve(&user, &booking_id).await?;
    Ok(Json(booking))
}

pub async fn reject_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service.reject(&user, &booking_id).await?;
    Ok(Json(booking))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service.cancel(&user, &booking_id).await?;
    Ok(Json(booking))
}
