use crate::domain::models::{booking::BookingFlow, discount::{DiscountKind, DiscountType}};
use crate::domain::services::booking_service::PaymentOutcome;
use chrono::{DateTime, Utc, NaiveDate};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateChaletRequest {
    pub name: String,
    pub price_per_night_cents: i64,
    #[serde(default)]
    pub cleaning_fee_cents: i64,
    pub max_guests: i32,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub guest_count: i32,
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub flow: BookingFlow,
}

#[derive(Deserialize)]
pub struct BlockDatesRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub label: Option<String>,
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct PaymentWebhookRequest {
    pub booking_id: String,
    pub outcome: PaymentOutcome,
}

#[derive(Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    pub subtotal_cents: i64,
}

#[derive(Deserialize)]
pub struct CreateDiscountRequest {
    pub code: String,
    #[serde(default = "default_discount_type")]
    pub discount_type: DiscountType,
    pub kind: DiscountKind,
    pub value: i64,
    pub max_uses: Option<i32>,
    pub min_booking_amount_cents: Option<i64>,
    pub valid_until: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

fn default_discount_type() -> DiscountType {
    DiscountType::Promo
}

#[derive(Deserialize)]
pub struct SetDiscountActiveRequest {
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct SubmitReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
    pub group_id: Option<String>,
}
