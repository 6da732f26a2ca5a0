use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct RewardGroup {
    pub id: String,
    pub booking_id: String,
    pub created_at: DateTime<Utc>,
}

impl RewardGroup {
    pub fn for_booking(booking_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    pub group_id: String,
    pub user_id: String,
    pub has_rated: bool,
    pub can_use_kaif: bool,
    pub joined_at: DateTime<Utc>,
}

impl GroupMembership {
    pub fn new(group_id: &str, user_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            has_rated: false,
            can_use_kaif: false,
            joined_at: Utc::now(),
        }
    }
}

/// A membership joined with the booking it belongs to.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct MemberStay {
    pub group_id: String,
    pub user_id: String,
    pub booking_id: String,
    pub chalet_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub has_rated: bool,
    pub can_use_kaif: bool,
}
