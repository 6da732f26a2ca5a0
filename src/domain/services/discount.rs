use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::domain::models::{
    discount::{normalize_code, Discount, DiscountKind, DiscountType, NewDiscountParams},
    identity::Identity,
};
use crate::domain::ports::DiscountRepository;
use crate::error::{AppError, CouponRejection};

/// Soft validation outcome, shown to the guest as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount_cents: Option<i64>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CouponRejection>,
    #[serde(skip)]
    pub discount_id: Option<String>,
}

impl CouponCheck {
    fn rejected(reason: CouponRejection, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            discount_amount_cents: None,
            message: message.into(),
            reason: Some(reason),
            discount_id: None,
        }
    }

    /// Hard form used by booking creation: the discount id to redeem and its amount.
    pub fn into_redemption(self) -> Result<(String, i64), AppError> {
        match (self.valid, self.discount_id, self.discount_amount_cents) {
            (true, Some(id), Some(amount)) => Ok((id, amount)),
            _ => Err(AppError::Coupon {
                reason: self.reason.unwrap_or(CouponRejection::CouponInvalid),
                message: self.message,
            }),
        }
    }
}

pub fn format_amount(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

/// Amount a discount takes off `subtotal_cents`, never more than the subtotal.
/// Percentages round half-up to the cent.
pub fn discount_amount(kind: DiscountKind, value: i64, subtotal_cents: i64) -> i64 {
    let raw = match kind {
        DiscountKind::Percentage => (subtotal_cents * value + 50) / 100,
        DiscountKind::Fixed => value,
    };
    raw.clamp(0, subtotal_cents)
}

/// Runs the coupon checks in order and stops at the first failure.
/// `discount` is the active PROMO row found for `code`, if any.
pub fn evaluate_coupon(code: &str, discount: Option<&Discount>, subtotal_cents: i64, now: DateTime<Utc>) -> CouponCheck {
    if code.trim().is_empty() {
        return CouponCheck::rejected(CouponRejection::CouponInvalid, "Coupon code is required");
    }

    let discount = match discount {
        Some(d) if d.is_active && d.discount_type() == Some(DiscountType::Promo) => d,
        _ => return CouponCheck::rejected(CouponRejection::CouponInvalid, "Invalid or expired coupon code"),
    };

    if let Some(valid_until) = discount.valid_until
        && valid_until < now {
        return CouponCheck::rejected(CouponRejection::CouponExpired, "Coupon has expired");
    }

    if let Some(max_uses) = discount.max_uses
        && discount.usage_count >= max_uses {
        return CouponCheck::rejected(CouponRejection::CouponLimitReached, "Coupon usage limit reached");
    }

    if let Some(min) = discount.min_booking_amount_cents
        && subtotal_cents < min {
        return CouponCheck::rejected(
            CouponRejection::CouponMinSpendNotMet,
            format!("Minimum booking amount of {} required for this coupon", format_amount(min)),
        );
    }

    let Some(kind) = discount.kind() else {
        return CouponCheck::rejected(CouponRejection::CouponInvalid, "Invalid or expired coupon code");
    };

    let amount = discount_amount(kind, discount.value, subtotal_cents);
    CouponCheck {
        valid: true,
        discount_amount_cents: Some(amount),
        message: format!("Coupon applied: {} off", format_amount(amount)),
        reason: None,
        discount_id: Some(discount.id.clone()),
    }
}

pub struct CreateDiscount {
    pub code: String,
    pub discount_type: DiscountType,
    pub kind: DiscountKind,
    pub value: i64,
    pub max_uses: Option<i32>,
    pub min_booking_amount_cents: Option<i64>,
    pub valid_until: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

pub struct DiscountService {
    repo: Arc<dyn DiscountRepository>,
}

fn require_admin(actor: &Identity) -> Result<(), AppError> {
    if !actor.is_admin() {
        return Err(AppError::Forbidden("Admin role required".into()));
    }
    Ok(())
}

impl DiscountService {
    pub fn new(repo: Arc<dyn DiscountRepository>) -> Self {
        Self { repo }
    }

    pub async fn validate(&self, code: &str, subtotal_cents: i64) -> Result<CouponCheck, AppError> {
        if subtotal_cents < 0 {
            return Err(AppError::Validation("Subtotal cannot be negative".into()));
        }
        let normalized = normalize_code(code);
        if normalized.is_empty() {
            return Ok(evaluate_coupon(&normalized, None, subtotal_cents, Utc::now()));
        }
        let discount = self.repo.find_active_promo(&normalized).await?;
        Ok(evaluate_coupon(&normalized, discount.as_ref(), subtotal_cents, Utc::now()))
    }

    pub async fn create(&self, actor: &Identity, input: CreateDiscount) -> Result<Discount, AppError> {
        require_admin(actor)?;

        let code = normalize_code(&input.code);
        if code.is_empty() {
            return Err(AppError::Validation("Discount code is required".into()));
        }
        match input.kind {
            DiscountKind::Percentage if !(0..=100).contains(&input.value) => {
                return Err(AppError::Validation("Percentage value must be between 0 and 100".into()));
            }
            DiscountKind::Fixed if input.value <= 0 => {
                return Err(AppError::Validation("Fixed discount must be a positive amount".into()));
            }
            _ => {}
        }
        if input.max_uses.is_some_and(|m| m < 0) {
            return Err(AppError::Validation("max_uses cannot be negative".into()));
        }
        if input.min_booking_amount_cents.is_some_and(|m| m < 0) {
            return Err(AppError::Validation("min_booking_amount cannot be negative".into()));
        }

        let discount = Discount::new(NewDiscountParams {
            code,
            discount_type: input.discount_type,
            kind: input.kind,
            value: input.value,
            max_uses: input.max_uses,
            min_booking_amount_cents: input.min_booking_amount_cents,
            valid_until: input.valid_until,
            description: input.description,
        });

        let created = self.repo.create(&discount).await?;
        info!("Discount {} created by {}", created.code, actor.user_id);
        Ok(created)
    }

    pub async fn set_active(&self, actor: &Identity, id: &str, is_active: bool) -> Result<Discount, AppError> {
        require_admin(actor)?;
        let updated = self.repo.set_active(id, is_active).await?
            .ok_or(AppError::NotFound("Discount not found".into()))?;
        info!("Discount {} set active={} by {}", updated.code, is_active, actor.user_id);
        Ok(updated)
    }

    pub async fn delete(&self, actor: &Identity, id: &str) -> Result<(), AppError> {
        require_admin(actor)?;
        if self.repo.delete(id).await? {
            info!("Discount {} deleted by {}", id, actor.user_id);
        }
        Ok(())
    }

    pub async fn get(&self, actor: &Identity, id: &str) -> Result<Discount, AppError> {
        require_admin(actor)?;
        self.repo.find_by_id(id).await?
            .ok_or(AppError::NotFound("Discount not found".into()))
    }

    pub async fn list(&self, actor: &Identity) -> Result<Vec<Discount>, AppError> {
        require_admin(actor)?;
        self.repo.list().await
    }

    pub async fn offers(&self, discount_type: DiscountType) -> Result<Vec<Discount>, AppError> {
        self.repo.list_active_offers(discount_type.as_str(), Utc::now()).await
    }
}
