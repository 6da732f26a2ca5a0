use crate::domain::models::booking::{AvailabilityEntry, Booking};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub chalet_id: String,
    pub booked: Vec<AvailabilityEntry>,
    /// Present when the caller asked about a specific range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

#[derive(Serialize)]
pub struct BookingStatusResponse {
    pub id: String,
    pub status: String,
    pub payment_status: String,
}

impl From<Booking> for BookingStatusResponse {
    fn from(b: Booking) -> Self {
        Self { id: b.id, status: b.status, payment_status: b.payment_status }
    }
}
