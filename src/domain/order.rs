use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::money::round_money;
use super::promo::PromoSnapshot;

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum stored
/// as a lowercase string column.
macro_rules! string_enum {
    ($name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(DomainError::InvalidInput(format!(
                        concat!("unknown ", $label, " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    Delivery,
    Takeaway,
    DineIn,
    QrCode,
    Staff,
}

string_enum!(OrderType, "order type" {
    Delivery => "delivery",
    Takeaway => "takeaway",
    DineIn => "dine_in",
    QrCode => "qr_code",
    Staff => "staff",
});

impl OrderType {
    /// Orders served at a restaurant table.
    pub fn is_table_order(&self) -> bool {
        matches!(self, OrderType::DineIn | OrderType::QrCode | OrderType::Staff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    Serving,
    OutForDelivery,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus, "order status" {
    Pending => "pending",
    Accepted => "accepted",
    Preparing => "preparing",
    Serving => "serving",
    OutForDelivery => "out_for_delivery",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Serving,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub const TERMINAL: [OrderStatus; 2] = [OrderStatus::Delivered, OrderStatus::Cancelled];

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cod,
    Online,
}

string_enum!(PaymentMethod, "payment method" {
    Cod => "cod",
    Online => "online",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

string_enum!(PaymentStatus, "payment status" {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * &BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModificationEntry {
    pub actor: Uuid,
    pub timestamp: DateTime<Utc>,
    pub change: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub table_id: Option<Uuid>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub applied_promo: Option<PromoSnapshot>,
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub delivery_charge: BigDecimal,
    pub total: BigDecimal,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub modification_log: Vec<ModificationEntry>,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Recomputes subtotal, discount and total from the items, keeping
    /// `total = subtotal - discount_amount + delivery_charge`.
    pub fn recompute_totals(&mut self) {
        let subtotal = self
            .items
            .iter()
            .fold(BigDecimal::zero(), |acc, i| acc + i.line_total());
        self.subtotal = round_money(&subtotal);
        self.discount_amount = match &self.applied_promo {
            Some(promo) => promo.compute_discount(&self.subtotal).amount,
            None => round_money(&BigDecimal::zero()),
        };
        self.delivery_charge = round_money(&self.delivery_charge);
        self.total = round_money(
            &(&self.subtotal - &self.discount_amount + &self.delivery_charge),
        );
    }
}

/// Kind of change recorded in the order outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEventType {
    Created,
    StatusChanged,
    ItemsAdded,
}

impl OrderEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventType::Created => "OrderCreated",
            OrderEventType::StatusChanged => "OrderStatusChanged",
            OrderEventType::ItemsAdded => "OrderItemsAdded",
        }
    }
}

/// A mutation produced under the order's lock, for the repository to
/// persist alongside the updated order header.
#[derive(Debug, Clone)]
pub struct OrderChange {
    pub new_items: Vec<OrderItem>,
    pub entry: ModificationEntry,
    pub event: OrderEventType,
}
