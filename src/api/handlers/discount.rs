use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateDiscountRequest, SetDiscountActiveRequest, ValidateCouponRequest};
use crate::domain::services::discount::CreateDiscount;
use crate::error::AppError;
use std::sync::Arc;

/// Soft check for the checkout form. Rejections come back as `valid: false`, not errors.
pub async fn validate_coupon(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ValidateCouponRequest>,
) -> Result<impl IntoResponse, AppError> {
    let check = state.discount_service.validate(&payload.code, payload.subtotal_cents).await?;
    Ok(Json(check))
}

pub async fn list_discounts(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let discounts = state.discount_service.list(&user).await?;
    Ok(Json(discounts))
}

pub async fn create_discount(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateDiscountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.discount_service.create(&user, CreateDiscount {
        code: payload.code,
        discount_type: payload.discount_type,
        kind: payload.kind,
        value: payload.value,
        max_uses: payload.max_uses,
        min_booking_amount_cents: payload.min_booking_amount_cents,
        valid_until: payload.valid_until,
        description: payload.description,
    }).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_discount(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(discount_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let discount = state.discount_service.get(&user, &discount_id).await?;
    Ok(Json(discount))
}

pub async fn set_discount_active(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(discount_id): Path<String>,
    Json(payload): Json<SetDiscountActiveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.discount_service.set_active(&user, &discount_id, payload.is_active).await?;
    Ok(Json(updated))
}

pub async fn delete_discount(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(discount_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.discount_service.delete(&user, &discount_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
