use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::errors::DomainError;
use crate::domain::money::round_money;
use crate::domain::ports::{DeliveryFeeProvider, OrderRepository, PromoCodeRepository, PromoRedemption};
use crate::domain::promo::{Discount, PromoCheck, PromoCode, PromoRejection, PromoSnapshot};

use super::cart_store::{CartStore, SessionContext};

/// Money summary of a cart, with or without a promo applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CartBreakdown {
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub delivery_charge: BigDecimal,
    pub final_total: BigDecimal,
    pub free_delivery: bool,
    pub applied_promo: Option<PromoSnapshot>,
}

pub struct PromoCodeEngine {
    promos: Arc<dyn PromoCodeRepository>,
    orders: Arc<dyn OrderRepository>,
    fees: Arc<dyn DeliveryFeeProvider>,
    carts: Arc<CartStore>,
}

impl PromoCodeEngine {
    pub fn new(
        promos: Arc<dyn PromoCodeRepository>,
        orders: Arc<dyn OrderRepository>,
        fees: Arc<dyn DeliveryFeeProvider>,
        carts: Arc<CartStore>,
    ) -> Self {
        Self {
            promos,
            orders,
            fees,
            carts,
        }
    }

    /// Validates `code` against an order. Never touches usage counters.
    pub fn validate(
        &self,
        code: &str,
        cart_subtotal: &BigDecimal,
        restaurant_id: Uuid,
        user_id: Uuid,
        user_is_first_time: bool,
    ) -> Result<PromoCode, DomainError> {
        let promo = self
            .promos
            .find_by_code(code)?
            .ok_or(PromoRejection::CodeNotFound)?;
        let user_redemptions = match promo.usage_limit_per_user {
            Some(_) => self.promos.user_redemptions(promo.id, user_id)?,
            None => 0,
        };
        let check = PromoCheck {
            subtotal: cart_subtotal.clone(),
            restaurant_id,
            user_is_first_time,
            user_redemptions,
        };
        promo.check(&check, Utc::now())?;
        Ok(promo)
    }

    /// Validates against a user's order, working out first-time status from
    /// their order history.
    pub fn validate_for_user(
        &self,
        code: &str,
        cart_subtotal: &BigDecimal,
        restaurant_id: Uuid,
        user_id: Uuid,
    ) -> Result<PromoCode, DomainError> {
        let first_time = self.orders.count_for_user(user_id)? == 0;
        self.validate(code, cart_subtotal, restaurant_id, user_id, first_time)
    }

    pub fn compute_discount(&self, promo: &PromoCode, subtotal: &BigDecimal) -> Discount {
        promo.compute_discount(subtotal)
    }

    pub fn consume(&self, promo: &PromoCode, user_id: Uuid) -> Result<(), DomainError> {
        self.promos.consume(&PromoRedemption {
            promo_id: promo.id,
            user_id,
        })
    }

    /// Attaches `code` to the session's cart after validating it against the
    /// current subtotal.
    pub fn apply(
        &self,
        session_id: &str,
        user_id: Uuid,
        code: &str,
    ) -> Result<CartBreakdown, DomainError> {
        self.carts.with_session(session_id, |ctx| {
            let restaurant_id = ctx.cart.restaurant_id().ok_or(DomainError::CartEmpty)?;
            let promo =
                self.validate_for_user(code, &ctx.cart.subtotal(), restaurant_id, user_id)?;
            ctx.applied_promo = Some(promo.code.clone());
            log::info!("Promo code {} applied for session {}", promo.code, session_id);
            self.breakdown_with(&ctx.cart, Some(&promo))
        })
    }

    /// Detaches any promo. Idempotent.
    pub fn remove(&self, session_id: &str) -> Result<CartBreakdown, DomainError> {
        self.carts.with_session(session_id, |ctx| {
            ctx.applied_promo = None;
            self.breakdown_with(&ctx.cart, None)
        })
    }

    /// Current breakdown for the session. An attached promo that no longer
    /// validates (e.g. items were removed below its minimum) is detached.
    pub fn breakdown(&self, session_id: &str, user_id: Uuid) -> Result<CartBreakdown, DomainError> {
        self.carts.with_session(session_id, |ctx| {
            let promo = self.revalidate_attached(ctx, user_id)?;
            self.breakdown_with(&ctx.cart, promo.as_ref())
        })
    }

    fn revalidate_attached(
        &self,
        ctx: &mut SessionContext,
        user_id: Uuid,
    ) -> Result<Option<PromoCode>, DomainError> {
        let (Some(code), Some(restaurant_id)) = (ctx.applied_promo.clone(), ctx.cart.restaurant_id())
        else {
            return Ok(None);
        };
        match self.validate_for_user(&code, &ctx.cart.subtotal(), restaurant_id, user_id) {
            Ok(promo) => Ok(Some(promo)),
            Err(DomainError::Promo(reason)) => {
                log::info!("Detached promo code {} from session: {}", code, reason);
                ctx.applied_promo = None;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn breakdown_with(
        &self,
        cart: &Cart,
        promo: Option<&PromoCode>,
    ) -> Result<CartBreakdown, DomainError> {
        let subtotal = round_money(&cart.subtotal());
        let base_delivery = match cart.restaurant_id() {
            Some(restaurant_id) => self.fees.delivery_charge(restaurant_id, None)?,
            None => BigDecimal::zero(),
        };
        let discount = promo
            .map(|p| p.compute_discount(&subtotal))
            .unwrap_or(Discount {
                amount: BigDecimal::zero(),
                free_delivery: false,
            });
        let delivery_charge = if discount.free_delivery {
            BigDecimal::zero()
        } else {
            base_delivery
        };
        let final_total = &subtotal - &discount.amount + &delivery_charge;
        Ok(CartBreakdown {
            subtotal,
            discount_amount: round_money(&discount.amount),
            delivery_charge: round_money(&delivery_charge),
            final_total: round_money(&final_total),
            free_delivery: discount.free_delivery,
            applied_promo: promo.map(PromoCode::snapshot),
        })
    }
}
