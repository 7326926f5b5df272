//! Order status transitions.
//!
//! ```text
//! pending ──► accepted ──► preparing ──► serving ───────────► delivered
//!    │            │            │   └───► out_for_delivery ──►    ▲
//!    │            │            │   └─────────────(takeaway)──────┘
//!    └────────────┴────────────┴──► cancelled
//! ```
//!
//! `serving` belongs to table orders (dine-in, QR code, staff) and
//! `out_for_delivery` to delivery orders. A takeaway order is handed over
//! straight from `preparing`. `delivered` and `cancelled` are terminal.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::menu::MenuItem;
use super::order::{
    ModificationEntry, Order, OrderChange, OrderEventType, OrderItem, OrderStatus, OrderType,
    PaymentMethod, PaymentStatus,
};

pub fn can_transition(order_type: OrderType, from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    match (from, to) {
        (Pending, Accepted) | (Pending, Cancelled) => true,
        (Accepted, Preparing) | (Accepted, Cancelled) => true,
        (Preparing, Cancelled) => true,
        (Preparing, Serving) => order_type.is_table_order(),
        (Preparing, OutForDelivery) => order_type == OrderType::Delivery,
        (Preparing, Delivered) => order_type == OrderType::Takeaway,
        (Serving, Delivered) | (OutForDelivery, Delivered) => true,
        _ => false,
    }
}

/// Statuses reachable in one step from `from`.
pub fn next_statuses(order_type: OrderType, from: OrderStatus) -> Vec<OrderStatus> {
    OrderStatus::ALL
        .into_iter()
        .filter(|to| can_transition(order_type, from, *to))
        .collect()
}

/// A line to append to an order that is already in flight.
#[derive(Debug, Clone)]
pub struct AddedLine {
    pub menu_item: MenuItem,
    pub quantity: i32,
    pub notes: Option<String>,
}

impl Order {
    pub fn transition(
        &mut self,
        to: OrderStatus,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<OrderChange, DomainError> {
        let from = self.status;
        if !can_transition(self.order_type, from, to) {
            return Err(DomainError::IllegalTransition { from, to });
        }

        self.status = to;
        match (to, self.payment_method, self.payment_status) {
            (OrderStatus::Delivered, PaymentMethod::Cod, PaymentStatus::Pending) => {
                self.payment_status = PaymentStatus::Paid;
            }
            (OrderStatus::Cancelled, PaymentMethod::Online, PaymentStatus::Paid) => {
                self.payment_status = PaymentStatus::Refunded;
            }
            _ => {}
        }
        self.updated_at = now;

        let entry = ModificationEntry {
            actor,
            timestamp: now,
            change: format!("status {from} -> {to}"),
        };
        self.modification_log.push(entry.clone());
        Ok(OrderChange {
            new_items: Vec::new(),
            entry,
            event: OrderEventType::StatusChanged,
        })
    }

    /// Appends new item rows and recomputes totals. Status is left as is,
    /// so a `serving` order keeps serving while the extra items are made.
    pub fn add_items(
        &mut self,
        lines: Vec<AddedLine>,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<OrderChange, DomainError> {
        if self.is_terminal() {
            return Err(DomainError::OrderTerminal(self.status));
        }
        if lines.is_empty() {
            return Err(DomainError::InvalidInput("no items to add".to_string()));
        }
        for line in &lines {
            if line.quantity <= 0 {
                return Err(DomainError::InvalidQuantity);
            }
            if !line.menu_item.is_available {
                return Err(DomainError::ItemUnavailable(line.menu_item.id));
            }
            if line.menu_item.restaurant_id != self.restaurant_id {
                return Err(DomainError::InvalidInput(format!(
                    "menu item {} belongs to another restaurant",
                    line.menu_item.id
                )));
            }
        }

        let new_items: Vec<OrderItem> = lines
            .into_iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4(),
                order_id: self.id,
                menu_item_id: line.menu_item.id,
                quantity: line.quantity,
                unit_price: line.menu_item.price,
                notes: line.notes,
                created_at: now,
            })
            .collect();

        let summary: Vec<String> = new_items
            .iter()
            .map(|i| format!("{}x {}", i.quantity, i.menu_item_id))
            .collect();
        let entry = ModificationEntry {
            actor,
            timestamp: now,
            change: format!("added items: {}", summary.join(", ")),
        };

        self.items.extend(new_items.iter().cloned());
        self.recompute_totals();
        self.updated_at = now;
        self.modification_log.push(entry.clone());

        Ok(OrderChange {
            new_items,
            entry,
            event: OrderEventType::ItemsAdded,
        })
    }
}
