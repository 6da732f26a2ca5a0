use std::sync::Arc;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::models::{
    booking::{Booking, BookingFlow, BookingStatus, BookingView, LifecycleEvent, NewBookingParams, Quote},
    discount::normalize_code,
    group::{GroupMembership, RewardGroup},
    identity::Identity,
    job::{Job, JOB_BOOKING_CANCELLATION, JOB_BOOKING_CONFIRMATION},
};
use crate::domain::ports::{BookingExtras, BookingRepository, JobRepository};
use crate::domain::services::availability::{AvailabilityService, DateRange};
use crate::domain::services::discount::DiscountService;
use crate::error::AppError;

pub struct CreateBooking {
    pub chalet_id: String,
    /// Authenticated caller, if any. Guests check out without one.
    pub actor: Option<Identity>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub guest_count: i32,
    pub coupon_code: Option<String>,
    pub flow: BookingFlow,
}

/// Signal from the payment gateway for a PENDING_PAYMENT booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
    TimedOut,
}

pub struct BookingService {
    booking_repo: Arc<dyn BookingRepository>,
    job_repo: Arc<dyn JobRepository>,
    availability: Arc<AvailabilityService>,
    discounts: Arc<DiscountService>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn validate_guest(input: &CreateBooking) -> Result<(), AppError> {
    if input.guest_name.trim().is_empty() {
        return Err(AppError::Validation("Guest name is required".into()));
    }
    let email = input.guest_email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid guest email is required".into()));
    }
    if input.guest_phone.trim().is_empty() {
        return Err(AppError::Validation("Guest phone is required".into()));
    }
    if input.guest_count < 1 {
        return Err(AppError::Validation("Guest count must be at least 1".into()));
    }
    Ok(())
}

impl BookingService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        job_repo: Arc<dyn JobRepository>,
        availability: Arc<AvailabilityService>,
        discounts: Arc<DiscountService>,
    ) -> Self {
        Self { booking_repo, job_repo, availability, discounts }
    }

    pub async fn create(&self, input: CreateBooking) -> Result<BookingView, AppError> {
        let range = DateRange::new(input.start_date, input.end_date)?;
        validate_guest(&input)?;

        let chalet = self.availability.find_chalet(&input.chalet_id).await?;
        if input.guest_count > chalet.max_guests {
            return Err(AppError::Validation(format!("This chalet hosts at most {} guests", chalet.max_guests)));
        }

        // DIRECT skips both the payment gateway and host approval.
        if input.flow == BookingFlow::Direct
            && !input.actor.as_ref().is_some_and(|a| a.can_manage_chalet(&chalet.host_id))
        {
            return Err(AppError::Forbidden("Only the chalet host can confirm a booking without payment".into()));
        }

        self.availability.ensure_available(&chalet.id, range, None).await?;

        let mut quote = Quote::new(range.nights() as i32, chalet.price_per_night_cents, chalet.cleaning_fee_cents);
        let mut extras = BookingExtras::default();

        let coupon_code = input.coupon_code.as_deref().map(normalize_code).filter(|c| !c.is_empty());
        if let Some(code) = &coupon_code {
            let check = self.discounts.validate(code, quote.subtotal_cents).await?;
            let (discount_id, amount) = check.into_redemption()?;
            quote = quote.with_discount(amount);
            extras.redeem_discount_id = Some(discount_id);
        }

        let traveler_id = input.actor.as_ref().map(|a| a.user_id.clone());
        let booking = Booking::new(NewBookingParams {
            chalet_id: chalet.id.clone(),
            traveler_id: traveler_id.clone(),
            guest_name: input.guest_name.trim().to_string(),
            guest_email: input.guest_email.trim().to_string(),
            guest_phone: input.guest_phone.trim().to_string(),
            start_date: range.start,
            end_date: range.end,
            guest_count: input.guest_count,
            quote,
            coupon_code,
            notes: None,
            flow: input.flow,
        });

        // Guest checkouts never get a reward group.
        if let Some(traveler_id) = &traveler_id {
            let group = RewardGroup::for_booking(&booking.id);
            let membership = GroupMembership::new(&group.id, traveler_id);
            extras.group = Some((group, membership));
        }
        let group_id = extras.group.as_ref().map(|(g, _)| g.id.clone());

        let created = self.booking_repo.create_atomic(&booking, &extras).await?;
        info!(
            booking_id = %created.id,
            chalet_id = %created.chalet_id,
            status = %created.status,
            total_cents = created.total_price_cents,
            "Booking created"
        );

        if created.status() == BookingStatus::Confirmed {
            self.notify(JOB_BOOKING_CONFIRMATION, &created).await;
        }

        Ok(BookingView::new(created, group_id, today()))
    }

    pub async fn get(&self, actor: &Identity, booking_id: &str) -> Result<BookingView, AppError> {
        let booking = self.find(booking_id).await?;
        let is_owner = booking.traveler_id.as_deref() == Some(actor.user_id.as_str());
        if !is_owner {
            self.require_chalet_manager(actor, &booking).await?;
        }
        let group_id = self.booking_repo.find_group_id(&booking.id).await?;
        Ok(BookingView::new(booking, group_id, today()))
    }

    pub async fn approve(&self, actor: &Identity, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.find(booking_id).await?;
        self.require_chalet_manager(actor, &booking).await?;
        self.apply(booking, LifecycleEvent::HostApproved).await
    }

    pub async fn reject(&self, actor: &Identity, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.find(booking_id).await?;
        self.require_chalet_manager(actor, &booking).await?;
        self.apply(booking, LifecycleEvent::HostRejected).await
    }

    /// Cutoff windows are the caller's policy; any confirmed booking can be cancelled here.
    /// Bookings still awaiting payment are closed by the payment gateway, not by this call.
    pub async fn cancel(&self, actor: &Identity, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.find(booking_id).await?;
        let is_owner = booking.traveler_id.as_deref() == Some(actor.user_id.as_str());
        if !is_owner {
            self.require_chalet_manager(actor, &booking).await?;
        }
        self.apply(booking, LifecycleEvent::Cancelled).await
    }

    pub async fn record_payment(&self, booking_id: &str, outcome: PaymentOutcome) -> Result<Booking, AppError> {
        let booking = self.find(booking_id).await?;
        let event = match outcome {
            PaymentOutcome::Succeeded => LifecycleEvent::PaymentSucceeded,
            PaymentOutcome::Failed | PaymentOutcome::TimedOut => LifecycleEvent::PaymentFailed,
        };
        self.apply(booking, event).await
    }

    async fn find(&self, booking_id: &str) -> Result<Booking, AppError> {
        self.booking_repo.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))
    }

    async fn require_chalet_manager(&self, actor: &Identity, booking: &Booking) -> Result<(), AppError> {
        let chalet = self.availability.find_chalet(&booking.chalet_id).await?;
        if !actor.can_manage_chalet(&chalet.host_id) {
            return Err(AppError::Forbidden("Not allowed to manage this booking".into()));
        }
        Ok(())
    }

    async fn apply(&self, booking: Booking, event: LifecycleEvent) -> Result<Booking, AppError> {
        if event.already_applied(&booking) {
            return Ok(booking);
        }
        let from = booking.status();
        if from != event.source() {
            return Err(AppError::Validation(format!("Cannot {} a booking that is {}", event.verb(), from)));
        }
        let to = event.target();

        let updated = self.booking_repo.transition(&booking.id, from, to, event.payment_status()).await?
            .ok_or_else(|| {
                warn!("Booking {} changed status concurrently, {} -> {} dropped", booking.id, from, to);
                AppError::Conflict("Booking status changed, please retry".into())
            })?;

        info!(booking_id = %updated.id, from = %from, to = %to, "Booking status changed");

        match to {
            BookingStatus::Confirmed => self.notify(JOB_BOOKING_CONFIRMATION, &updated).await,
            BookingStatus::Cancelled if from == BookingStatus::Confirmed => {
                self.notify(JOB_BOOKING_CANCELLATION, &updated).await
            }
            _ => {}
        }
        Ok(updated)
    }

    /// Enqueues an outbox job after the booking is committed. Failures are logged only.
    async fn notify(&self, job_type: &str, booking: &Booking) {
        if booking.is_manual_block() {
            return;
        }
        let job = Job::new(job_type, booking.id.clone(), Utc::now());
        if let Err(e) = self.job_repo.create(&job).await {
            error!("Failed to enqueue {} for booking {}: {:?}", job_type, booking.id, e);
        }
    }
}
