use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::menu::MenuItem;
use crate::domain::order::{ModificationEntry, Order, OrderItem};
use crate::domain::promo::{PromoCode, PromoSnapshot};
use crate::domain::table::RestaurantTable;
use crate::schema::{
    menu_items, order_items, order_modifications, order_outbox, orders, promo_code_usages,
    promo_codes, restaurant_tables,
};

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = menu_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MenuItemRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub is_available: bool,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        MenuItem {
            id: row.id,
            restaurant_id: row.restaurant_id,
            name: row.name,
            price: row.price,
            is_available: row.is_available,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = menu_items)]
pub struct NewMenuItemRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub is_available: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = restaurant_tables)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TableRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub table_number: i32,
    pub capacity: i32,
    pub qr_identifier: String,
    pub is_active: bool,
}

impl From<TableRow> for RestaurantTable {
    fn from(row: TableRow) -> Self {
        RestaurantTable {
            id: row.id,
            restaurant_id: row.restaurant_id,
            table_number: row.table_number,
            capacity: row.capacity,
            qr_identifier: row.qr_identifier,
            is_active: row.is_active,
        }
    }
}

impl From<&RestaurantTable> for TableRow {
    fn from(table: &RestaurantTable) -> Self {
        TableRow {
            id: table.id,
            restaurant_id: table.restaurant_id,
            table_number: table.table_number,
            capacity: table.capacity,
            qr_identifier: table.qr_identifier.clone(),
            is_active: table.is_active,
        }
    }
}

// ── Promo codes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = promo_codes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PromoCodeRow {
    pub id: Uuid,
    pub code: String,
    pub discount_type: String,
    pub discount_value: BigDecimal,
    pub minimum_order_amount: BigDecimal,
    pub max_discount_amount: Option<BigDecimal>,
    pub usage_limit: Option<i32>,
    pub usage_limit_per_user: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub restaurant_id: Option<Uuid>,
    pub first_time_only: bool,
    pub is_active: bool,
    pub times_used: i32,
}

impl TryFrom<PromoCodeRow> for PromoCode {
    type Error = DomainError;

    fn try_from(row: PromoCodeRow) -> Result<Self, Self::Error> {
        Ok(PromoCode {
            id: row.id,
            code: row.code,
            discount_type: row.discount_type.parse()?,
            discount_value: row.discount_value,
            minimum_order_amount: row.minimum_order_amount,
            max_discount_amount: row.max_discount_amount,
            usage_limit: row.usage_limit,
            usage_limit_per_user: row.usage_limit_per_user,
            start_date: row.start_date,
            end_date: row.end_date,
            restaurant_id: row.restaurant_id,
            first_time_only: row.first_time_only,
            is_active: row.is_active,
            times_used: row.times_used,
        })
    }
}

impl From<&PromoCode> for PromoCodeRow {
    fn from(promo: &PromoCode) -> Self {
        PromoCodeRow {
            id: promo.id,
            code: promo.code.clone(),
            discount_type: promo.discount_type.as_str().to_string(),
            discount_value: promo.discount_value.clone(),
            minimum_order_amount: promo.minimum_order_amount.clone(),
            max_discount_amount: promo.max_discount_amount.clone(),
            usage_limit: promo.usage_limit,
            usage_limit_per_user: promo.usage_limit_per_user,
            start_date: promo.start_date,
            end_date: promo.end_date,
            restaurant_id: promo.restaurant_id,
            first_time_only: promo.first_time_only,
            is_active: promo.is_active,
            times_used: promo.times_used,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = promo_code_usages)]
pub struct NewPromoUsageRow {
    pub promo_code_id: Uuid,
    pub user_id: Uuid,
    pub times_used: i32,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub table_id: Option<Uuid>,
    pub order_type: String,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub promo_code: Option<String>,
    pub promo_discount_type: Option<String>,
    pub promo_discount_value: Option<BigDecimal>,
    pub promo_max_discount_amount: Option<BigDecimal>,
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub delivery_charge: BigDecimal,
    pub total: BigDecimal,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub fn into_order(
        self,
        items: Vec<OrderItemRow>,
        modifications: Vec<ModificationRow>,
    ) -> Result<Order, DomainError> {
        let applied_promo = match (self.promo_code, self.promo_discount_type) {
            (Some(code), Some(discount_type)) => Some(PromoSnapshot {
                code,
                discount_type: discount_type.parse()?,
                discount_value: self.promo_discount_value.unwrap_or_default(),
                max_discount_amount: self.promo_max_discount_amount,
            }),
            _ => None,
        };

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            restaurant_id: self.restaurant_id,
            table_id: self.table_id,
            order_type: self.order_type.parse()?,
            status: self.status.parse()?,
            payment_method: self.payment_method.parse()?,
            payment_status: self.payment_status.parse()?,
            applied_promo,
            subtotal: self.subtotal,
            discount_amount: self.discount_amount,
            delivery_charge: self.delivery_charge,
            total: self.total,
            delivery_address: self.delivery_address,
            special_instructions: self.special_instructions,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items: items.into_iter().map(OrderItem::from).collect(),
            modification_log: modifications
                .into_iter()
                .map(ModificationEntry::from)
                .collect(),
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub table_id: Option<Uuid>,
    pub order_type: String,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub promo_code: Option<String>,
    pub promo_discount_type: Option<String>,
    pub promo_discount_value: Option<BigDecimal>,
    pub promo_max_discount_amount: Option<BigDecimal>,
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub delivery_charge: BigDecimal,
    pub total: BigDecimal,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for NewOrderRow {
    fn from(order: &Order) -> Self {
        let promo = order.applied_promo.as_ref();
        NewOrderRow {
            id: order.id,
            user_id: order.user_id,
            restaurant_id: order.restaurant_id,
            table_id: order.table_id,
            order_type: order.order_type.as_str().to_string(),
            status: order.status.as_str().to_string(),
            payment_method: order.payment_method.as_str().to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            promo_code: promo.map(|p| p.code.clone()),
            promo_discount_type: promo.map(|p| p.discount_type.as_str().to_string()),
            promo_discount_value: promo.map(|p| p.discount_value.clone()),
            promo_max_discount_amount: promo.and_then(|p| p.max_discount_amount.clone()),
            subtotal: order.subtotal.clone(),
            discount_amount: order.discount_amount.clone(),
            delivery_charge: order.delivery_charge.clone(),
            total: order.total.clone(),
            delivery_address: order.delivery_address.clone(),
            special_instructions: order.special_instructions.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Header columns that change after creation.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = orders)]
pub struct OrderChangeset {
    pub status: String,
    pub payment_status: String,
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub delivery_charge: BigDecimal,
    pub total: BigDecimal,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderChangeset {
    fn from(order: &Order) -> Self {
        OrderChangeset {
            status: order.status.as_str().to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            subtotal: order.subtotal.clone(),
            discount_amount: order.discount_amount.clone(),
            delivery_charge: order.delivery_charge.clone(),
            total: order.total.clone(),
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            menu_item_id: row.menu_item_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&OrderItem> for NewOrderItemRow {
    fn from(item: &OrderItem) -> Self {
        NewOrderItemRow {
            id: item.id,
            order_id: item.order_id,
            menu_item_id: item.menu_item_id,
            quantity: item.quantity,
            unit_price: item.unit_price.clone(),
            notes: item.notes.clone(),
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_modifications)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ModificationRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub actor_id: Uuid,
    pub change: String,
    pub created_at: DateTime<Utc>,
}

impl From<ModificationRow> for ModificationEntry {
    fn from(row: ModificationRow) -> Self {
        ModificationEntry {
            actor: row.actor_id,
            timestamp: row.created_at,
            change: row.change,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_modifications)]
pub struct NewModificationRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub actor_id: Uuid,
    pub change: String,
    pub created_at: DateTime<Utc>,
}

// ── Outbox ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
