//! In-process implementation of every storage port.
//!
//! Used for embedding the order core without PostgreSQL and throughout the
//! test suite. Locking mirrors the PostgreSQL adapter: one mutex per order
//! stands in for the row lock, and one mutex per promo code makes the
//! usage check-and-increment atomic.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::menu::MenuItem;
use crate::domain::order::{Order, OrderChange, OrderEventType, OrderStatus};
use crate::domain::ports::{
    MenuCatalog, OrderRepository, PromoCodeRepository, PromoRedemption, TableRepository,
};
use crate::domain::promo::PromoCode;
use crate::domain::table::{RestaurantTable, TableOrderRef};

use super::order_event_payload;

#[derive(Debug, Clone, PartialEq)]
pub struct OutboxMessage {
    pub aggregate_id: Uuid,
    pub event_type: &'static str,
    pub payload: Value,
}

#[derive(Debug)]
struct PromoRecord {
    promo: PromoCode,
    redemptions: HashMap<Uuid, i32>,
}

impl PromoRecord {
    fn try_consume(&mut self, user_id: Uuid) -> Result<(), DomainError> {
        if let Some(limit) = self.promo.usage_limit {
            if self.promo.times_used >= limit {
                return Err(DomainError::LimitRace);
            }
        }
        let used_by_user = self.redemptions.get(&user_id).copied().unwrap_or(0);
        if let Some(limit) = self.promo.usage_limit_per_user {
            if used_by_user >= limit {
                return Err(DomainError::LimitRace);
            }
        }
        self.promo.times_used += 1;
        self.redemptions.insert(user_id, used_by_user + 1);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    menu: DashMap<Uuid, MenuItem>,
    tables: DashMap<Uuid, RestaurantTable>,
    promos: DashMap<Uuid, Arc<Mutex<PromoRecord>>>,
    promo_codes: DashMap<String, Uuid>,
    orders: DashMap<Uuid, Arc<Mutex<Order>>>,
    outbox: Mutex<Vec<OutboxMessage>>,
}

impl MemoryStore {
    /// Inserts or replaces a menu item.
    pub fn insert_menu_item(&self, item: MenuItem) {
        self.menu.insert(item.id, item);
    }

    pub fn insert_table(&self, table: RestaurantTable) {
        self.tables.insert(table.id, table);
    }

    pub fn insert_promo(&self, promo: PromoCode) {
        self.promo_codes
            .insert(PromoCode::normalize(&promo.code), promo.id);
        self.promos.insert(
            promo.id,
            Arc::new(Mutex::new(PromoRecord {
                promo,
                redemptions: HashMap::new(),
            })),
        );
    }

    /// Current state of a promo code, counters included.
    pub fn promo(&self, code: &str) -> Option<PromoCode> {
        let record = self.promo_record_by_code(code)?;
        let promo = record.lock().promo.clone();
        Some(promo)
    }

    pub fn orders_snapshot(&self) -> Vec<Order> {
        self.order_slots()
            .into_iter()
            .map(|slot| slot.lock().clone())
            .collect()
    }

    pub fn outbox_messages(&self) -> Vec<OutboxMessage> {
        self.outbox.lock().clone()
    }

    fn promo_record_by_code(&self, code: &str) -> Option<Arc<Mutex<PromoRecord>>> {
        let id = *self.promo_codes.get(&PromoCode::normalize(code))?;
        self.promos.get(&id).map(|r| r.value().clone())
    }

    fn promo_record(&self, id: Uuid) -> Result<Arc<Mutex<PromoRecord>>, DomainError> {
        self.promos
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(DomainError::NotFound("Promo code"))
    }

    fn order_slots(&self) -> Vec<Arc<Mutex<Order>>> {
        self.orders.iter().map(|e| e.value().clone()).collect()
    }

    fn insert_order(&self, order: &Order) -> Result<(), DomainError> {
        match self.orders.entry(order.id) {
            Entry::Occupied(_) => {
                return Err(DomainError::Internal(format!(
                    "order {} already exists",
                    order.id
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(order.clone())));
            }
        }
        self.record(order, OrderEventType::Created);
        Ok(())
    }

    fn order_slot(&self, id: Uuid) -> Option<Arc<Mutex<Order>>> {
        self.orders.get(&id).map(|s| s.value().clone())
    }

    fn record(&self, order: &Order, event: OrderEventType) {
        self.outbox.lock().push(OutboxMessage {
            aggregate_id: order.id,
            event_type: event.as_str(),
            payload: order_event_payload(order, event),
        });
    }
}

impl MenuCatalog for MemoryStore {
    fn find_menu_item(&self, id: Uuid) -> Result<Option<MenuItem>, DomainError> {
        Ok(self.menu.get(&id).map(|m| m.value().clone()))
    }
}

impl TableRepository for MemoryStore {
    fn find_table(&self, id: Uuid) -> Result<Option<RestaurantTable>, DomainError> {
        Ok(self.tables.get(&id).map(|t| t.value().clone()))
    }

    fn find_table_by_qr(&self, qr_identifier: &str) -> Result<Option<RestaurantTable>, DomainError> {
        Ok(self
            .tables
            .iter()
            .find(|t| t.qr_identifier == qr_identifier)
            .map(|t| t.value().clone()))
    }

    fn list_tables(&self, restaurant_id: Uuid) -> Result<Vec<RestaurantTable>, DomainError> {
        let mut tables: Vec<RestaurantTable> = self
            .tables
            .iter()
            .filter(|t| t.restaurant_id == restaurant_id)
            .map(|t| t.value().clone())
            .collect();
        tables.sort_by_key(|t| t.table_number);
        Ok(tables)
    }
}

impl PromoCodeRepository for MemoryStore {
    fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError> {
        Ok(self.promo(code))
    }

    fn user_redemptions(&self, promo_id: Uuid, user_id: Uuid) -> Result<i32, DomainError> {
        let record = self.promo_record(promo_id)?;
        let used = record.lock().redemptions.get(&user_id).copied().unwrap_or(0);
        Ok(used)
    }

    fn consume(&self, redemption: &PromoRedemption) -> Result<(), DomainError> {
        let record = self.promo_record(redemption.promo_id)?;
        let mut record = record.lock();
        record.try_consume(redemption.user_id)
    }
}

impl OrderRepository for MemoryStore {
    fn create(&self, order: &Order, redemption: Option<&PromoRedemption>) -> Result<(), DomainError> {
        let Some(redemption) = redemption else {
            return self.insert_order(order);
        };
        // The promo stays locked until the order is in place, so the two
        // land together.
        let record = self.promo_record(redemption.promo_id)?;
        let mut record = record.lock();
        let before = (
            record.promo.times_used,
            record.redemptions.get(&redemption.user_id).copied(),
        );
        record.try_consume(redemption.user_id)?;
        if let Err(e) = self.insert_order(order) {
            record.promo.times_used = before.0;
            match before.1 {
                Some(n) => record.redemptions.insert(redemption.user_id, n),
                None => record.redemptions.remove(&redemption.user_id),
            };
            return Err(e);
        }
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.order_slot(id).map(|slot| slot.lock().clone()))
    }

    fn update(
        &self,
        id: Uuid,
        change: &mut dyn FnMut(&mut Order) -> Result<OrderChange, DomainError>,
    ) -> Result<Order, DomainError> {
        let slot = self.order_slot(id).ok_or(DomainError::NotFound("Order"))?;
        let mut current = slot.lock();
        let mut next = current.clone();
        let applied = change(&mut next)?;
        *current = next.clone();
        self.record(&next, applied.event);
        Ok(next)
    }

    fn list_for_restaurant(
        &self,
        restaurant_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<Order>, DomainError> {
        let mut orders: Vec<Order> = self
            .orders_snapshot()
            .into_iter()
            .filter(|o| o.restaurant_id == restaurant_id)
            .filter(|o| !active_only || !o.is_terminal())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    fn table_orders(&self, restaurant_id: Uuid) -> Result<Vec<TableOrderRef>, DomainError> {
        Ok(self
            .orders_snapshot()
            .into_iter()
            .filter(|o| o.restaurant_id == restaurant_id)
            .filter_map(|o| {
                o.table_id.map(|table_id| TableOrderRef {
                    order_id: o.id,
                    table_id,
                    status: o.status,
                })
            })
            .collect())
    }

    fn count_for_user(&self, user_id: Uuid) -> Result<i64, DomainError> {
        let count = self
            .orders_snapshot()
            .iter()
            .filter(|o| o.user_id == user_id && o.status != OrderStatus::Cancelled)
            .count();
        Ok(count as i64)
    }
}
