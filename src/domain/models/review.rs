use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const MAX_COMMENT_LEN: usize = 2000;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Review {
    pub id: String,
    pub chalet_id: String,
    pub user_id: String,
    pub rating: i32,
    pub comment: String,
    pub group_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(chalet_id: String, user_id: String, rating: i32, comment: String, group_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            chalet_id,
            user_id,
            rating,
            comment,
            group_id,
            created_at: Utc::now(),
        }
    }
}

/// Chalet aggregate after a review landed.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct ChaletRating {
    pub rating: f64,
    pub review_count: i32,
}

#[derive(Debug, Serialize)]
pub struct SubmittedReview {
    pub review: Review,
    pub chalet_rating: ChaletRating,
}
