use crate::domain::{models::group::{MemberStay, RewardGroup}, ports::GroupRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

const STAY_SELECT: &str =
    "SELECT m.group_id, m.user_id, g.booking_id, b.chalet_id, b.start_date, b.end_date, b.status, m.has_rated, m.can_use_kaif
     FROM group_memberships m
     JOIN reward_groups g ON g.id = m.group_id
     JOIN bookings b ON b.id = g.booking_id";

pub struct PostgresGroupRepo {
    pool: PgPool,
}

impl PostgresGroupRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepo {
    async fn find_group(&self, group_id: &str) -> Result<Option<RewardGroup>, AppError> {
        sqlx::query_as::<_, RewardGroup>("SELECT * FROM reward_groups WHERE id = $1")
            .bind(group_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_stay(&self, group_id: &str, user_id: &str) -> Result<Option<MemberStay>, AppError> {
        let sql = format!("{} WHERE m.group_id = $1 AND m.user_id = $2", STAY_SELECT);
        sqlx::query_as::<_, MemberStay>(&sql)
            .bind(group_id).bind(user_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_stays_for_user(&self, user_id: &str) -> Result<Vec<MemberStay>, AppError> {
        let sql = format!("{} WHERE m.user_id = $1 ORDER BY b.start_date ASC", STAY_SELECT);
        sqlx::query_as::<_, MemberStay>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
