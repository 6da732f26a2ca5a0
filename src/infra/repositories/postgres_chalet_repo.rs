use crate::domain::{models::chalet::Chalet, ports::ChaletRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresChaletRepo {
    pool: PgPool,
}

impl PostgresChaletRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChaletRepository for PostgresChaletRepo {
    async fn create(&self, chalet: &Chalet) -> Result<Chalet, AppError> {
        sqlx::query_as::<_, Chalet>(
            "INSERT INTO chalets (id, host_id, name, price_per_night_cents, cleaning_fee_cents, max_guests, rating, review_count, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *"
        )
            .bind(&chalet.id).bind(&chalet.host_id).bind(&chalet.name).bind(chalet.price_per_night_cents)
            .bind(chalet.cleaning_fee_cents).bind(chalet.max_guests).bind(chalet.rating).bind(chalet.review_count)
            .bind(chalet.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Chalet>, AppError> {
        sqlx::query_as::<_, Chalet>("SELECT * FROM chalets WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
