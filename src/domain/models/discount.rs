use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// What a discount row is for. Only PROMO codes are redeemable at checkout;
/// ZAD and KAIF rows are reward-tier offers surfaced on the reward card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Promo,
    Zad,
    Kaif,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Promo => "PROMO",
            DiscountType::Zad => "ZAD",
            DiscountType::Kaif => "KAIF",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROMO" => Ok(DiscountType::Promo),
            "ZAD" => Ok(DiscountType::Zad),
            "KAIF" => Ok(DiscountType::Kaif),
            other => Err(format!("Unknown discount type: {}", other)),
        }
    }
}

/// How `value` is read: a percent of the subtotal, or an amount in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "PERCENTAGE",
            DiscountKind::Fixed => "FIXED",
        }
    }
}

impl FromStr for DiscountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERCENTAGE" => Ok(DiscountKind::Percentage),
            "FIXED" => Ok(DiscountKind::Fixed),
            other => Err(format!("Unknown discount kind: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Discount {
    pub id: String,
    pub code: String,
    pub discount_type: String,
    pub kind: String,
    pub value: i64,
    pub is_active: bool,
    pub max_uses: Option<i32>,
    pub usage_count: i32,
    pub min_booking_amount_cents: Option<i64>,
    pub valid_until: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct NewDiscountParams {
    pub code: String,
    pub discount_type: DiscountType,
    pub kind: DiscountKind,
    pub value: i64,
    pub max_uses: Option<i32>,
    pub min_booking_amount_cents: Option<i64>,
    pub valid_until: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl Discount {
    pub fn new(params: NewDiscountParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            code: normalize_code(&params.code),
            discount_type: params.discount_type.as_str().to_string(),
            kind: params.kind.as_str().to_string(),
            value: params.value,
            is_active: true,
            max_uses: params.max_uses,
            usage_count: 0,
            min_booking_amount_cents: params.min_booking_amount_cents,
            valid_until: params.valid_until,
            description: params.description,
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> Option<DiscountKind> {
        self.kind.parse().ok()
    }

    pub fn discount_type(&self) -> Option<DiscountType> {
        self.discount_type.parse().ok()
    }
}

/// Codes are matched case-insensitively by storing them uppercase.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
