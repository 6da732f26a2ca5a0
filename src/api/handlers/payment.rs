use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{requests::PaymentWebhookRequest, responses::BookingStatusResponse};
use crate::error::AppError;
use constant_time_eq::constant_time_eq;
use std::sync::Arc;
use tracing::{info, warn};

pub const PAYMENT_SECRET_HEADER: &str = "X-Payment-Secret";

/// Payment gateway callback for bookings awaiting payment.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<PaymentWebhookRequest>,
) -> Result<impl IntoResponse, AppError> {
    let secret = headers.get(PAYMENT_SECRET_HEADER).map(|v| v.as_bytes()).unwrap_or_default();
    if secret.is_empty() || !constant_time_eq(secret, state.config.payment_webhook_secret.as_bytes()) {
        warn!("Payment webhook rejected for booking {}", payload.booking_id);
        return Err(AppError::Unauthorized);
    }

    info!("Payment signal {:?} for booking {}", payload.outcome, payload.booking_id);
    let booking = state.booking_service.record_payment(&payload.booking_id, payload.outcome).await?;
    Ok(Json(BookingStatusResponse::from(booking)))
}
