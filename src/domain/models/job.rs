use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const JOB_BOOKING_CONFIRMATION: &str = "BOOKING_CONFIRMATION";
pub const JOB_BOOKING_CANCELLATION: &str = "BOOKING_CANCELLATION";

pub const MAX_ATTEMPTS: i32 = 5;
const RETRY_BASE_SECS: i64 = 30;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobPayload {
    pub booking_id: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Job {
    pub id: String,
    pub job_type: String, // "BOOKING_CONFIRMATION" or "BOOKING_CANCELLATION"
    pub payload: Json<JobPayload>,
    pub execute_at: DateTime<Utc>,
    pub status: String,
    pub attempts: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_type: &str, booking_id: String, execute_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_type: job_type.to_string(),
            payload: Json(JobPayload { booking_id }),
            execute_at,
            status: "PENDING".to_string(),
            attempts: 0,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    /// Next run time after a failed attempt, or None once attempts are exhausted.
    pub fn next_retry_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let attempts = self.attempts + 1;
        if attempts >= MAX_ATTEMPTS {
            return None;
        }
        Some(now + Duration::seconds(RETRY_BASE_SECS << attempts))
    }
}
