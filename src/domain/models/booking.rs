use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Guest name stored on host-created holds so they never read as a real stay.
pub const MANUAL_BLOCK_GUEST: &str = "__MANUAL_BLOCK__";

/// Statuses that keep a chalet's dates unavailable.
pub const DATE_HOLDING_STATUSES: [BookingStatus; 3] = [
    BookingStatus::PendingPayment,
    BookingStatus::Pending,
    BookingStatus::Confirmed,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingPayment,
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingPayment => "PENDING_PAYMENT",
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn holds_dates(&self) -> bool {
        DATE_HOLDING_STATUSES.contains(self)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What moves a booking out of its current status. Each trigger fires from exactly one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    PaymentSucceeded,
    PaymentFailed,
    HostApproved,
    HostRejected,
    Cancelled,
}

impl LifecycleEvent {
    pub fn source(&self) -> BookingStatus {
        match self {
            LifecycleEvent::PaymentSucceeded | LifecycleEvent::PaymentFailed => BookingStatus::PendingPayment,
            LifecycleEvent::HostApproved | LifecycleEvent::HostRejected => BookingStatus::Pending,
            LifecycleEvent::Cancelled => BookingStatus::Confirmed,
        }
    }

    pub fn target(&self) -> BookingStatus {
        match self {
            LifecycleEvent::PaymentSucceeded | LifecycleEvent::HostApproved => BookingStatus::Confirmed,
            LifecycleEvent::PaymentFailed | LifecycleEvent::Cancelled => BookingStatus::Cancelled,
            LifecycleEvent::HostRejected => BookingStatus::Rejected,
        }
    }

    pub fn payment_status(&self) -> Option<&'static str> {
        match self {
            LifecycleEvent::PaymentSucceeded => Some(payment_status::PAID),
            LifecycleEvent::PaymentFailed => Some(payment_status::FAILED),
            _ => None,
        }
    }

    /// The booking already shows this event's outcome, so replaying it changes nothing.
    pub fn already_applied(&self, booking: &Booking) -> bool {
        booking.status() == self.target()
            && self.payment_status().is_none_or(|p| booking.payment_status == p)
    }

    pub fn verb(&self) -> &'static str {
        match self {
            LifecycleEvent::PaymentSucceeded => "record a successful payment for",
            LifecycleEvent::PaymentFailed => "record a failed payment for",
            LifecycleEvent::HostApproved => "approve",
            LifecycleEvent::HostRejected => "reject",
            LifecycleEvent::Cancelled => "cancel",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_PAYMENT" => Ok(BookingStatus::PendingPayment),
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "REJECTED" => Ok(BookingStatus::Rejected),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

pub mod payment_status {
    pub const AWAITING: &str = "AWAITING";
    pub const PAID: &str = "PAID";
    pub const FAILED: &str = "FAILED";
    pub const NOT_REQUIRED: &str = "NOT_REQUIRED";
}

/// How a new booking enters the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingFlow {
    /// Payment gateway confirms later.
    #[default]
    Online,
    /// Host approves later.
    Request,
    /// No gate, confirmed immediately.
    Direct,
}

impl BookingFlow {
    pub fn initial_status(&self) -> (BookingStatus, &'static str) {
        match self {
            BookingFlow::Online => (BookingStatus::PendingPayment, payment_status::AWAITING),
            BookingFlow::Request => (BookingStatus::Pending, payment_status::NOT_REQUIRED),
            BookingFlow::Direct => (BookingStatus::Confirmed, payment_status::NOT_REQUIRED),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub chalet_id: String,
    pub traveler_id: Option<String>,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guest_count: i32,
    pub price_per_night_cents: i64,
    pub nights: i32,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub cleaning_fee_cents: i64,
    pub total_price_cents: i64,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Price breakdown computed before a booking is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub nights: i32,
    pub price_per_night_cents: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub cleaning_fee_cents: i64,
    pub total_price_cents: i64,
}

impl Quote {
    pub fn new(nights: i32, price_per_night_cents: i64, cleaning_fee_cents: i64) -> Self {
        let subtotal_cents = nights as i64 * price_per_night_cents;
        Self {
            nights,
            price_per_night_cents,
            subtotal_cents,
            discount_cents: 0,
            cleaning_fee_cents,
            total_price_cents: subtotal_cents + cleaning_fee_cents,
        }
    }

    pub fn with_discount(mut self, discount_cents: i64) -> Self {
        self.discount_cents = discount_cents.clamp(0, self.subtotal_cents);
        self.total_price_cents = self.subtotal_cents - self.discount_cents + self.cleaning_fee_cents;
        self
    }
}

pub struct NewBookingParams {
    pub chalet_id: String,
    pub traveler_id: Option<String>,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guest_count: i32,
    pub quote: Quote,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub flow: BookingFlow,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let (status, payment_status) = params.flow.initial_status();
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            chalet_id: params.chalet_id,
            traveler_id: params.traveler_id,
            guest_name: params.guest_name,
            guest_email: params.guest_email,
            guest_phone: params.guest_phone,
            start_date: params.start_date,
            end_date: params.end_date,
            guest_count: params.guest_count,
            price_per_night_cents: params.quote.price_per_night_cents,
            nights: params.quote.nights,
            subtotal_cents: params.quote.subtotal_cents,
            discount_cents: params.quote.discount_cents,
            cleaning_fee_cents: params.quote.cleaning_fee_cents,
            total_price_cents: params.quote.total_price_cents,
            coupon_code: params.coupon_code,
            notes: params.notes,
            status: status.as_str().to_string(),
            payment_status: payment_status.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn manual_block(chalet_id: String, start_date: NaiveDate, end_date: NaiveDate, label: Option<String>) -> Self {
        let nights = (end_date - start_date).num_days() as i32;
        let mut block = Self::new(NewBookingParams {
            chalet_id,
            traveler_id: None,
            guest_name: MANUAL_BLOCK_GUEST.to_string(),
            guest_email: String::new(),
            guest_phone: String::new(),
            start_date,
            end_date,
            guest_count: 0,
            quote: Quote::new(nights, 0, 0),
            coupon_code: None,
            notes: label,
            flow: BookingFlow::Direct,
        });
        block.payment_status = payment_status::NOT_REQUIRED.to_string();
        block
    }

    /// Unknown stored values read as CANCELLED so a corrupt row never holds dates or earns rewards.
    pub fn status(&self) -> BookingStatus {
        parse_stored_status(&self.status, &self.id)
    }

    pub fn is_manual_block(&self) -> bool {
        self.guest_name == MANUAL_BLOCK_GUEST
    }

    /// COMPLETED is never stored: a confirmed stay whose checkout day has arrived.
    pub fn is_completed(&self, today: NaiveDate) -> bool {
        self.status() == BookingStatus::Confirmed && today >= self.end_date
    }
}

pub fn parse_stored_status(raw: &str, booking_id: &str) -> BookingStatus {
    raw.parse().unwrap_or_else(|e| {
        warn!("Booking {}: {}, treating as CANCELLED", booking_id, e);
        BookingStatus::Cancelled
    })
}

/// Booking as returned to callers, with derived read-time facts.
#[derive(Debug, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub completed: bool,
    pub group_id: Option<String>,
}

impl BookingView {
    pub fn new(booking: Booking, group_id: Option<String>, today: NaiveDate) -> Self {
        let completed = booking.is_completed(today);
        Self { booking, completed, group_id }
    }
}

/// Public availability entry; guest details stay private.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AvailabilityEntry {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
}

impl From<&Booking> for AvailabilityEntry {
    fn from(b: &Booking) -> Self {
        Self {
            start_date: b.start_date,
            end_date: b.end_date,
            status: b.status.clone(),
        }
    }
}
