use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Chalet {
    pub id: String,
    pub host_id: String,
    pub name: String,
    pub price_per_night_cents: i64,
    pub cleaning_fee_cents: i64,
    pub max_guests: i32,
    pub rating: f64,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Chalet {
    pub fn new(host_id: String, name: String, price_per_night_cents: i64, cleaning_fee_cents: i64, max_guests: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            host_id,
            name,
            price_per_night_cents,
            cleaning_fee_cents,
            max_guests,
            rating: 0.0,
            review_count: 0,
            created_at: Utc::now(),
        }
    }
}
