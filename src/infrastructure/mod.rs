pub mod catalog_repo;
pub mod delivery_fee;
pub mod memory;
pub mod models;
pub mod order_repo;
pub mod promo_repo;
#[cfg(test)]
mod test_db;

use std::sync::Arc;

use serde_json::{json, Value};

use crate::db::DbPool;
use crate::domain::money::format_money;
use crate::domain::order::{Order, OrderEventType};
use crate::domain::ports::{
    DeliveryFeeProvider, MenuCatalog, OrderRepository, PromoCodeRepository, TableRepository,
};

/// The set of adapters the application services run on.
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn MenuCatalog>,
    pub tables: Arc<dyn TableRepository>,
    pub promos: Arc<dyn PromoCodeRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub fees: Arc<dyn DeliveryFeeProvider>,
}

impl Repositories {
    pub fn postgres(pool: DbPool, fees: Arc<dyn DeliveryFeeProvider>) -> Self {
        let catalog = Arc::new(catalog_repo::DieselCatalogRepository::new(pool.clone()));
        Self {
            catalog: catalog.clone(),
            tables: catalog,
            promos: Arc::new(promo_repo::DieselPromoCodeRepository::new(pool.clone())),
            orders: Arc::new(order_repo::DieselOrderRepository::new(pool)),
            fees,
        }
    }

    pub fn in_memory(store: Arc<memory::MemoryStore>, fees: Arc<dyn DeliveryFeeProvider>) -> Self {
        Self {
            catalog: store.clone(),
            tables: store.clone(),
            promos: store.clone(),
            orders: store,
            fees,
        }
    }
}

/// Outbox payload describing the order after `event`. External relays
/// (notifications, kitchen printers) consume these rows.
pub(crate) fn order_event_payload(order: &Order, event: OrderEventType) -> Value {
    let items: Vec<Value> = order
        .items
        .iter()
        .map(|i| {
            json!({
                "menu_item_id": i.menu_item_id,
                "quantity": i.quantity,
                "unit_price": format_money(&i.unit_price),
            })
        })
        .collect();

    json!({
        "event_type": event.as_str(),
        "order_id": order.id,
        "user_id": order.user_id,
        "restaurant_id": order.restaurant_id,
        "table_id": order.table_id,
        "order_type": order.order_type.as_str(),
        "status": order.status.as_str(),
        "payment_status": order.payment_status.as_str(),
        "total": format_money(&order.total),
        "items": items,
    })
}
