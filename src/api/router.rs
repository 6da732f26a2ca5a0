use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, chalet, booking, payment, discount, reward};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Chalets & Availability
        .route("/api/v1/chalets", post(chalet::create_chalet))
        .route("/api/v1/chalets/{chalet_id}", get(chalet::get_chalet))
        .route("/api/v1/chalets/{chalet_id}/availability", get(chalet::get_availability))
        .route("/api/v1/chalets/{chalet_id}/blocks", post(chalet::block_dates))

        // Booking Lifecycle
        .route("/api/v1/chalets/{chalet_id}/bookings", post(booking::create_booking))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))
        .route("/api/v1/bookings/{booking_id}/approve", post(booking::approve_booking))
        .route("/api/v1/bookings/{booking_id}/reject", post(booking::reject_booking))
        .route("/api/v1/bookings/{booking_id}/cancel", post(booking::cancel_booking))
        .route("/api/v1/payments/webhook", post(payment::payment_webhook))

        // Coupons & Discount Admin
        .route("/api/v1/coupons/validate", post(discount::validate_coupon))
        .route("/api/v1/admin/discounts", get(discount::list_discounts).post(discount::create_discount))
        .route("/api/v1/admin/discounts/{discount_id}", get(discount::get_discount).delete(discount::delete_discount))
        .route("/api/v1/admin/discounts/{discount_id}/active", put(discount::set_discount_active))

        // Reviews & Rewards
        .route("/api/v1/chalets/{chalet_id}/reviews", get(reward::list_reviews).post(reward::submit_review))
        .route("/api/v1/rewards/card", get(reward::my_reward_card))
        .route("/api/v1/groups/{group_id}/reward-card", get(reward::group_reward_card))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
