use crate::domain::{models::review::{ChaletRating, Review}, ports::ReviewRepository};
use crate::error::{is_unique_violation, AppError};
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresReviewRepo {
    pool: PgPool,
}

impl PostgresReviewRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PostgresReviewRepo {
    async fn create_with_rating(&self, review: &Review) -> Result<ChaletRating, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Serializes rating recomputation per chalet so concurrent reviews see each other.
        sqlx::query("SELECT id FROM chalets WHERE id = $1 FOR UPDATE")
            .bind(&review.chalet_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Chalet not found".into()))?;

        if let Some(group_id) = &review.group_id {
            let result = sqlx::query(
                "UPDATE group_memberships SET has_rated = TRUE, can_use_kaif = TRUE
                 WHERE group_id = $1 AND user_id = $2 AND has_rated = FALSE"
            )
                .bind(group_id).bind(&review.user_id)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
            if result.rows_affected() == 0 {
                return Err(AppError::Conflict("This stay has already been reviewed".into()));
            }
        }

        sqlx::query(
            "INSERT INTO reviews (id, chalet_id, user_id, rating, comment, group_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        )
            .bind(&review.id).bind(&review.chalet_id).bind(&review.user_id).bind(review.rating)
            .bind(&review.comment).bind(&review.group_id).bind(review.created_at)
            .execute(&mut *tx).await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("You have already reviewed this chalet".into())
                } else {
                    AppError::Database(e)
                }
            })?;

        // Full recompute, never incremental.
        let rating = sqlx::query_as::<_, ChaletRating>(
            "UPDATE chalets SET
                 rating = COALESCE((SELECT ROUND(AVG(r.rating), 2)::float8 FROM reviews r WHERE r.chalet_id = $1), 0),
                 review_count = (SELECT COUNT(*) FROM reviews r WHERE r.chalet_id = $1)
             WHERE id = $1
             RETURNING rating, review_count"
        )
            .bind(&review.chalet_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Chalet not found".into()))?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(rating)
    }

    async fn list_by_chalet(&self, chalet_id: &str) -> Result<Vec<Review>, AppError> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE chalet_id = $1 ORDER BY created_at DESC")
            .bind(chalet_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
