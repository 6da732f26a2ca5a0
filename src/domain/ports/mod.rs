use crate::domain::models::{
    booking::{Booking, BookingStatus}, chalet::Chalet, discount::Discount,
    group::{GroupMembership, MemberStay, RewardGroup}, job::Job,
    review::{ChaletRating, Review},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Rows written in the same transaction as a new booking.
#[derive(Debug, Clone, Default)]
pub struct BookingExtras {
    /// Id of the PROMO discount to redeem.
    pub redeem_discount_id: Option<String>,
    pub group: Option<(RewardGroup, GroupMembership)>,
}

#[async_trait]
pub trait ChaletRepository: Send + Sync {
    async fn create(&self, chalet: &Chalet) -> Result<Chalet, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Chalet>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts the booking only if no date-holding booking overlaps it, redeems the
    /// coupon and creates the reward group, all in one transaction.
    /// Overlap yields `AppError::DateConflict`, an exhausted coupon `AppError::Coupon`.
    async fn create_atomic(&self, booking: &Booking, extras: &BookingExtras) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn find_overlapping(&self, chalet_id: &str, start: NaiveDate, end: NaiveDate, exclude_id: Option<&str>) -> Result<Vec<Booking>, AppError>;
    async fn list_holding_from(&self, chalet_id: &str, from: NaiveDate) -> Result<Vec<Booking>, AppError>;
    /// Compare-and-set on status. Returns None when the booking is no longer in `from`.
    async fn transition(&self, id: &str, from: BookingStatus, to: BookingStatus, payment_status: Option<&str>) -> Result<Option<Booking>, AppError>;
    async fn find_group_id(&self, booking_id: &str) -> Result<Option<String>, AppError>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_group(&self, group_id: &str) -> Result<Option<RewardGroup>, AppError>;
    async fn find_stay(&self, group_id: &str, user_id: &str) -> Result<Option<MemberStay>, AppError>;
    async fn list_stays_for_user(&self, user_id: &str) -> Result<Vec<MemberStay>, AppError>;
}

#[async_trait]
pub trait DiscountRepository: Send + Sync {
    async fn create(&self, discount: &Discount) -> Result<Discount, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Discount>, AppError>;
    /// Active PROMO discount with this (already normalized) code.
    async fn find_active_promo(&self, code: &str) -> Result<Option<Discount>, AppError>;
    async fn list(&self) -> Result<Vec<Discount>, AppError>;
    async fn list_active_offers(&self, discount_type: &str, now: DateTime<Utc>) -> Result<Vec<Discount>, AppError>;
    async fn set_active(&self, id: &str, is_active: bool) -> Result<Option<Discount>, AppError>;
    /// Returns false when nothing was deleted.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Inserts the review, flips the reviewer's membership when the review is tied
    /// to a group, and recomputes the chalet rating, in one transaction.
    async fn create_with_rating(&self, review: &Review) -> Result<ChaletRating, AppError>;
    async fn list_by_chalet(&self, chalet_id: &str) -> Result<Vec<Review>, AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<Job, AppError>;
    async fn find_pending(&self, limit: i32) -> Result<Vec<Job>, AppError>;
    async fn list_by_booking(&self, booking_id: &str) -> Result<Vec<Job>, AppError>;
    async fn mark_completed(&self, id: &str) -> Result<(), AppError>;
    async fn reschedule(&self, id: &str, attempts: i32, execute_at: DateTime<Utc>, error_message: &str) -> Result<(), AppError>;
    async fn mark_failed(&self, id: &str, attempts: i32, error_message: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}
