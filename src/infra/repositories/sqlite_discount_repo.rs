use crate::domain::{models::discount::Discount, ports::DiscountRepository};
use crate::error::{is_unique_violation, AppError};
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::{DateTime, Utc};

pub struct SqliteDiscountRepo {
    pool: SqlitePool,
}

impl SqliteDiscountRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscountRepository for SqliteDiscountRepo {
    async fn create(&self, discount: &Discount) -> Result<Discount, AppError> {
        sqlx::query_as::<_, Discount>(
            "INSERT INTO discounts (id, code, discount_type, kind, value, is_active, max_uses, usage_count, min_booking_amount_cents, valid_until, description, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&discount.id).bind(&discount.code).bind(&discount.discount_type).bind(&discount.kind)
            .bind(discount.value).bind(discount.is_active).bind(discount.max_uses).bind(discount.usage_count)
            .bind(discount.min_booking_amount_cents).bind(discount.valid_until).bind(&discount.description)
            .bind(discount.created_at)
            .fetch_one(&self.pool).await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("Discount code {} already exists", discount.code))
                } else {
                    AppError::Database(e)
                }
            })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Discount>, AppError> {
        sqlx::query_as::<_, Discount>("SELECT * FROM discounts WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_active_promo(&self, code: &str) -> Result<Option<Discount>, AppError> {
        sqlx::query_as::<_, Discount>("SELECT * FROM discounts WHERE code = ? AND discount_type = 'PROMO' AND is_active = TRUE")
            .bind(code)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Discount>, AppError> {
        sqlx::query_as::<_, Discount>("SELECT * FROM discounts ORDER BY created_at DESC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active_offers(&self, discount_type: &str, now: DateTime<Utc>) -> Result<Vec<Discount>, AppError> {
        sqlx::query_as::<_, Discount>(
            "SELECT * FROM discounts
             WHERE discount_type = ? AND is_active = TRUE
             AND (valid_until IS NULL OR valid_until >= ?)
             AND (max_uses IS NULL OR usage_count < max_uses)
             ORDER BY created_at ASC"
        )
            .bind(discount_type).bind(now)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn set_active(&self, id: &str, is_active: bool) -> Result<Option<Discount>, AppError> {
        sqlx::query_as::<_, Discount>("UPDATE discounts SET is_active = ? WHERE id = ? RETURNING *")
            .bind(is_active).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = ?").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
