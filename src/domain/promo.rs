use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::errors::DomainError;
use super::money::round_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountType {
    Percentage,
    Fixed,
    FreeDelivery,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
            DiscountType::FreeDelivery => "free_delivery",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed" => Ok(DiscountType::Fixed),
            "free_delivery" => Ok(DiscountType::FreeDelivery),
            other => Err(DomainError::InvalidInput(format!(
                "unknown discount type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: BigDecimal,
    pub minimum_order_amount: BigDecimal,
    /// Caps percentage discounts.
    pub max_discount_amount: Option<BigDecimal>,
    pub usage_limit: Option<i32>,
    pub usage_limit_per_user: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// `None` applies to every restaurant.
    pub restaurant_id: Option<Uuid>,
    pub first_time_only: bool,
    pub is_active: bool,
    pub times_used: i32,
}

/// Order-side facts a promo code is checked against.
#[derive(Debug, Clone)]
pub struct PromoCheck {
    pub subtotal: BigDecimal,
    pub restaurant_id: Uuid,
    pub user_is_first_time: bool,
    /// How many times this user has already redeemed the code.
    pub user_redemptions: i32,
}

/// User-facing reasons a code cannot be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PromoRejection {
    #[error("Invalid promo code.")]
    CodeNotFound,
    #[error("This promo code is no longer active.")]
    CodeInactive,
    #[error("This promo code is not valid yet.")]
    NotYetActive,
    #[error("This promo code has expired.")]
    Expired,
    #[error("This promo code has reached its usage limit.")]
    UsageLimitReached,
    #[error("This promo code is not valid for this restaurant.")]
    WrongRestaurant,
    #[error("This promo code is only valid on your first order.")]
    NotEligible,
    #[error("You have already used this promo code the maximum number of times.")]
    PerUserLimitReached,
    #[error("Minimum order amount of {minimum} required.")]
    BelowMinimum { minimum: BigDecimal },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Discount {
    pub amount: BigDecimal,
    pub free_delivery: bool,
}

/// What an order remembers about the promo it was placed with, enough to
/// recompute the discount when items are added later.
#[derive(Debug, Clone, PartialEq)]
pub struct PromoSnapshot {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: BigDecimal,
    pub max_discount_amount: Option<BigDecimal>,
}

impl PromoSnapshot {
    pub fn compute_discount(&self, subtotal: &BigDecimal) -> Discount {
        match self.discount_type {
            DiscountType::Percentage => {
                let raw = round_money(&(subtotal * &self.discount_value / BigDecimal::from(100)));
                let amount = match &self.max_discount_amount {
                    Some(cap) if raw > *cap => cap.clone(),
                    _ => raw,
                };
                Discount {
                    amount: round_money(&amount),
                    free_delivery: false,
                }
            }
            DiscountType::Fixed => {
                let amount = if self.discount_value > *subtotal {
                    subtotal.clone()
                } else {
                    self.discount_value.clone()
                };
                Discount {
                    amount: round_money(&amount),
                    free_delivery: false,
                }
            }
            DiscountType::FreeDelivery => Discount {
                amount: round_money(&BigDecimal::zero()),
                free_delivery: true,
            },
        }
    }
}

impl PromoCode {
    /// Case-insensitive lookup key.
    pub fn normalize(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// Checks activation, timing, capacity, applicability and the order
    /// minimum, in that order, stopping at the first failure. Whether the
    /// code exists at all is the caller's concern.
    pub fn check(&self, order: &PromoCheck, now: DateTime<Utc>) -> Result<(), PromoRejection> {
        if !self.is_active {
            return Err(PromoRejection::CodeInactive);
        }
        if now < self.start_date {
            return Err(PromoRejection::NotYetActive);
        }
        if now > self.end_date {
            return Err(PromoRejection::Expired);
        }
        if let Some(limit) = self.usage_limit {
            if self.times_used >= limit {
                return Err(PromoRejection::UsageLimitReached);
            }
        }
        if let Some(restaurant_id) = self.restaurant_id {
            if restaurant_id != order.restaurant_id {
                return Err(PromoRejection::WrongRestaurant);
            }
        }
        if self.first_time_only && !order.user_is_first_time {
            return Err(PromoRejection::NotEligible);
        }
        if let Some(limit) = self.usage_limit_per_user {
            if order.user_redemptions >= limit {
                return Err(PromoRejection::PerUserLimitReached);
            }
        }
        if order.subtotal < self.minimum_order_amount {
            return Err(PromoRejection::BelowMinimum {
                minimum: round_money(&self.minimum_order_amount),
            });
        }
        Ok(())
    }

    pub fn snapshot(&self) -> PromoSnapshot {
        PromoSnapshot {
            code: self.code.clone(),
            discount_type: self.discount_type,
            discount_value: self.discount_value.clone(),
            max_discount_amount: self.max_discount_amount.clone(),
        }
    }

    pub fn compute_discount(&self, subtotal: &BigDecimal) -> Discount {
        self.snapshot().compute_discount(subtotal)
    }
}
