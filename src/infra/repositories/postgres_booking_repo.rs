use crate::domain::{models::booking::{Booking, BookingStatus}, ports::{BookingExtras, BookingRepository}};
use crate::error::{is_exclusion_violation, AppError, CouponRejection};
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{NaiveDate, Utc};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(e: sqlx::Error) -> AppError {
    if is_exclusion_violation(&e) {
        AppError::date_conflict()
    } else {
        AppError::Database(e)
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create_atomic(&self, booking: &Booking, extras: &BookingExtras) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Concurrent inserts that both pass NOT EXISTS are caught by bookings_no_overlap.
        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, chalet_id, traveler_id, guest_name, guest_email, guest_phone, start_date, end_date, guest_count, price_per_night_cents, nights, subtotal_cents, discount_cents, cleaning_fee_cents, total_price_cents, coupon_code, notes, status, payment_status, created_at, updated_at)
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
             WHERE NOT EXISTS (
                 SELECT 1 FROM bookings
                 WHERE chalet_id = $2 AND start_date < $8 AND end_date > $7
                 AND status IN ('PENDING_PAYMENT', 'PENDING', 'CONFIRMED')
             )
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.chalet_id).bind(&booking.traveler_id).bind(&booking.guest_name)
            .bind(&booking.guest_email).bind(&booking.guest_phone).bind(booking.start_date).bind(booking.end_date)
            .bind(booking.guest_count).bind(booking.price_per_night_cents).bind(booking.nights).bind(booking.subtotal_cents)
            .bind(booking.discount_cents).bind(booking.cleaning_fee_cents).bind(booking.total_price_cents)
            .bind(&booking.coupon_code).bind(&booking.notes).bind(&booking.status).bind(&booking.payment_status)
            .bind(booking.created_at).bind(booking.updated_at)
            .fetch_optional(&mut *tx).await.map_err(map_insert_error)?
            .ok_or_else(AppError::date_conflict)?;

        if let Some(discount_id) = &extras.redeem_discount_id {
            let result = sqlx::query(
                "UPDATE discounts SET usage_count = usage_count + 1
                 WHERE id = $1 AND is_active = TRUE AND (max_uses IS NULL OR usage_count < max_uses)
                 AND (valid_until IS NULL OR valid_until >= $2)"
            )
                .bind(discount_id).bind(Utc::now())
                .execute(&mut *tx).await.map_err(AppError::Database)?;
            if result.rows_affected() == 0 {
                return Err(AppError::Coupon {
                    reason: CouponRejection::CouponLimitReached,
                    message: "Coupon usage limit reached".to_string(),
                });
            }
        }

        if let Some((group, membership)) = &extras.group {
            sqlx::query("INSERT INTO reward_groups (id, booking_id, created_at) VALUES ($1, $2, $3)")
                .bind(&group.id).bind(&group.booking_id).bind(group.created_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
            sqlx::query("INSERT INTO group_memberships (group_id, user_id, has_rated, can_use_kaif, joined_at) VALUES ($1, $2, $3, $4, $5)")
                .bind(&membership.group_id).bind(&membership.user_id).bind(membership.has_rated)
                .bind(membership.can_use_kaif).bind(membership.joined_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(map_insert_error)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_overlapping(&self, chalet_id: &str, start: NaiveDate, end: NaiveDate, exclude_id: Option<&str>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE chalet_id = $1 AND start_date < $2 AND end_date > $3
             AND status IN ('PENDING_PAYMENT', 'PENDING', 'CONFIRMED')
             AND id <> COALESCE($4, '')
             ORDER BY start_date ASC"
        )
            .bind(chalet_id).bind(end).bind(start).bind(exclude_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_holding_from(&self, chalet_id: &str, from: NaiveDate) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE chalet_id = $1 AND end_date > $2
             AND status IN ('PENDING_PAYMENT', 'PENDING', 'CONFIRMED')
             ORDER BY start_date ASC"
        )
            .bind(chalet_id).bind(from)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn transition(&self, id: &str, from: BookingStatus, to: BookingStatus, payment_status: Option<&str>) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $1, payment_status = COALESCE($2, payment_status), updated_at = $3
             WHERE id = $4 AND status = $5
             RETURNING *"
        )
            .bind(to.as_str()).bind(payment_status).bind(Utc::now()).bind(id).bind(from.as_str())
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_group_id(&self, booking_id: &str) -> Result<Option<String>, AppError> {
        sqlx::query_scalar::<_, String>("SELECT id FROM reward_groups WHERE booking_id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
