use std::sync::Arc;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::models::{
    booking::{AvailabilityEntry, Booking},
    chalet::Chalet,
    identity::Identity,
};
use crate::domain::ports::{BookingExtras, BookingRepository, ChaletRepository};
use crate::error::AppError;

/// Half-open stay `[start, end)`: `end` is the checkout day and is free for the next guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start >= end {
            return Err(AppError::Validation("Start date must be before end date".into()));
        }
        Ok(Self { start, end })
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn of(booking: &Booking) -> Self {
        Self { start: booking.start_date, end: booking.end_date }
    }
}

pub struct AvailabilityService {
    booking_repo: Arc<dyn BookingRepository>,
    chalet_repo: Arc<dyn ChaletRepository>,
}

impl AvailabilityService {
    pub fn new(booking_repo: Arc<dyn BookingRepository>, chalet_repo: Arc<dyn ChaletRepository>) -> Self {
        Self { booking_repo, chalet_repo }
    }

    /// Date-holding bookings on the chalet that overlap `range`.
    pub async fn check_overlap(&self, chalet_id: &str, range: DateRange, exclude_id: Option<&str>) -> Result<Vec<Booking>, AppError> {
        let found = self.booking_repo.find_overlapping(chalet_id, range.start, range.end, exclude_id).await?;
        Ok(found
            .into_iter()
            .filter(|b| b.status().holds_dates() && DateRange::of(b).overlaps(&range))
            .collect())
    }

    pub async fn ensure_available(&self, chalet_id: &str, range: DateRange, exclude_id: Option<&str>) -> Result<(), AppError> {
        let conflicts = self.check_overlap(chalet_id, range, exclude_id).await?;
        if !conflicts.is_empty() {
            warn!(
                chalet_id = %chalet_id,
                start = %range.start,
                end = %range.end,
                conflicts = conflicts.len(),
                "Date range rejected: overlaps existing booking"
            );
            return Err(AppError::date_conflict());
        }
        Ok(())
    }

    pub async fn find_chalet(&self, chalet_id: &str) -> Result<Chalet, AppError> {
        self.chalet_repo.find_by_id(chalet_id).await?
            .ok_or(AppError::NotFound("Chalet not found".into()))
    }

    /// Host-only manual hold, stored as a CONFIRMED booking under the sentinel guest name.
    pub async fn create_block(&self, actor: &Identity, chalet_id: &str, range: DateRange, label: Option<String>) -> Result<Booking, AppError> {
        let chalet = self.find_chalet(chalet_id).await?;
        if !actor.can_manage_chalet(&chalet.host_id) {
            return Err(AppError::Forbidden("Only the chalet host can block dates".into()));
        }

        self.ensure_available(chalet_id, range, None).await?;

        let block = Booking::manual_block(chalet.id, range.start, range.end, label);
        let created = self.booking_repo.create_atomic(&block, &BookingExtras::default()).await?;
        info!("Manual block {} created on chalet {} ({} -> {})", created.id, chalet_id, range.start, range.end);
        Ok(created)
    }

    /// Held date ranges that have not ended before `today`.
    pub async fn availability(&self, chalet_id: &str, today: NaiveDate) -> Result<Vec<AvailabilityEntry>, AppError> {
        self.find_chalet(chalet_id).await?;
        let bookings = self.booking_repo.list_holding_from(chalet_id, today).await?;
        Ok(bookings.iter().map(AvailabilityEntry::from).collect())
    }
}
