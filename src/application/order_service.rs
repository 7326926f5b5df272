use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{MenuCatalog, OrderRepository};
use crate::domain::state_machine::AddedLine;

use super::order_factory::LineRequest;

/// Drives orders through their status lifecycle on behalf of staff and
/// kitchen actors. Status changes and item additions for one order are
/// serialized by the repository's per-order lock.
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn MenuCatalog>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderRepository>, catalog: Arc<dyn MenuCatalog>) -> Self {
        Self { orders, catalog }
    }

    pub fn transition(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        actor: Uuid,
    ) -> Result<Order, DomainError> {
        let result = self
            .orders
            .update(order_id, &mut |order: &mut Order| {
                order.transition(new_status, actor, Utc::now())
            });
        match &result {
            Ok(order) => log::info!(
                "Order {} moved to {} by {}",
                order.id,
                order.status,
                actor
            ),
            Err(DomainError::IllegalTransition { from, to }) => log::warn!(
                "Rejected transition {} -> {} on order {} by {}",
                from,
                to,
                order_id,
                actor
            ),
            Err(_) => {}
        }
        result
    }

    pub fn add_items(
        &self,
        order_id: Uuid,
        lines: &[LineRequest],
        actor: Uuid,
    ) -> Result<Order, DomainError> {
        let mut added = Vec::with_capacity(lines.len());
        for line in lines {
            let menu_item = self
                .catalog
                .find_menu_item(line.menu_item_id)?
                .ok_or(DomainError::ItemUnavailable(line.menu_item_id))?;
            added.push(AddedLine {
                menu_item,
                quantity: line.quantity,
                notes: line.notes.clone(),
            });
        }

        let result = self.orders.update(order_id, &mut |order: &mut Order| {
            order.add_items(added.clone(), actor, Utc::now())
        });
        match &result {
            Ok(order) => log::info!(
                "Added {} item(s) to order {} by {} (new total {})",
                lines.len(),
                order.id,
                actor,
                order.total
            ),
            Err(DomainError::OrderTerminal(status)) => log::warn!(
                "Attempt by {} to add items to {} order {}",
                actor,
                status,
                order_id
            ),
            Err(_) => {}
        }
        result
    }

    pub fn get_order(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.orders.find_by_id(id)
    }

    pub fn list_for_restaurant(
        &self,
        restaurant_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<Order>, DomainError> {
        self.orders.list_for_restaurant(restaurant_id, active_only)
    }
}
