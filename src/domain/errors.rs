use thiserror::Error;

use super::order::OrderStatus;
use super::promo::PromoRejection;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Quantity must be a positive whole number")]
    InvalidQuantity,

    #[error("Menu item {0} is no longer available")]
    ItemUnavailable(uuid::Uuid),

    #[error("Cart was modified elsewhere (expected version {expected}, current version {current})")]
    StaleVersion { expected: u64, current: u64 },

    #[error("Your cart is empty")]
    CartEmpty,

    /// A cart line's price or availability changed. Re-adding keeps the old
    /// price, so the client has to remove the line and add it again.
    #[error("Menu item {0} changed since it was added to your cart; remove it and add it again")]
    CartStale(uuid::Uuid),

    #[error("{0}")]
    Promo(#[from] PromoRejection),

    #[error("This promo code has reached its usage limit.")]
    LimitRace,

    #[error("Cannot change order status from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order is already {0} and can no longer be modified")]
    OrderTerminal(OrderStatus),

    #[error("Internal error: {0}")]
    Internal(String),
}
