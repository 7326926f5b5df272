//! Request and response bodies. Money always travels as a two-decimal
//! string ("597.00") and timestamps as RFC 3339.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_factory::LineRequest;
use crate::application::promo_engine::CartBreakdown;
use crate::application::table_occupancy::TableStatusReport;
use crate::domain::cart::{Cart, CartLine};
use crate::domain::money::format_money;
use crate::domain::order::{ModificationEntry, Order, OrderItem};
use crate::domain::promo::PromoSnapshot;
use crate::domain::state_machine::next_statuses;
use crate::domain::table::TableOccupancy;

// ── Cart ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
    /// Cart version the client last saw.
    pub expected_version: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub menu_item_id: Uuid,
    /// New quantity; 0 removes the line.
    pub quantity: i32,
    pub expected_version: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveCartItemRequest {
    pub menu_item_id: Uuid,
    pub expected_version: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartLineResponse {
    pub menu_item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
    pub notes: Option<String>,
}

impl From<&CartLine> for CartLineResponse {
    fn from(line: &CartLine) -> Self {
        Self {
            menu_item_id: line.menu_item_id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: format_money(&line.unit_price),
            line_total: format_money(&line.line_total()),
            notes: line.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    pub version: u64,
    pub restaurant_id: Option<Uuid>,
    pub items: Vec<CartLineResponse>,
    pub subtotal: String,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            version: cart.version(),
            restaurant_id: cart.restaurant_id(),
            items: cart.lines().iter().map(CartLineResponse::from).collect(),
            subtotal: format_money(&cart.subtotal()),
        }
    }
}

/// Body of a 409 on a stale cart write: the server's cart as it is now.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartConflictResponse {
    pub error: String,
    pub current: CartResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppliedPromoResponse {
    pub code: String,
    pub discount_type: String,
    pub discount_value: String,
    pub max_discount_amount: Option<String>,
}

impl From<&PromoSnapshot> for AppliedPromoResponse {
    fn from(promo: &PromoSnapshot) -> Self {
        Self {
            code: promo.code.clone(),
            discount_type: promo.discount_type.as_str().to_string(),
            discount_value: format_money(&promo.discount_value),
            max_discount_amount: promo.max_discount_amount.as_ref().map(format_money),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartBreakdownResponse {
    pub subtotal: String,
    pub discount_amount: String,
    pub delivery_charge: String,
    pub final_total: String,
    pub free_delivery: bool,
    pub applied_promo_code: Option<AppliedPromoResponse>,
}

impl From<&CartBreakdown> for CartBreakdownResponse {
    fn from(b: &CartBreakdown) -> Self {
        Self {
            subtotal: format_money(&b.subtotal),
            discount_amount: format_money(&b.discount_amount),
            delivery_charge: format_money(&b.delivery_charge),
            final_total: format_money(&b.final_total),
            free_delivery: b.free_delivery,
            applied_promo_code: b.applied_promo.as_ref().map(AppliedPromoResponse::from),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartViewResponse {
    pub cart: CartResponse,
    pub cart_breakdown: CartBreakdownResponse,
}

// ── Promo ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyPromoRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplyPromoResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_breakdown: Option<CartBreakdownResponse>,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

impl From<&OrderLineRequest> for LineRequest {
    fn from(line: &OrderLineRequest) -> Self {
        LineRequest {
            menu_item_id: line.menu_item_id,
            quantity: line.quantity,
            notes: line.notes.clone(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// One of `delivery`, `takeaway`, `dine_in`, `qr_code`, `staff`.
    pub order_type: String,
    pub table_id: Option<Uuid>,
    pub qr_identifier: Option<String>,
    pub delivery_address: Option<String>,
    /// `cod` or `online`.
    pub payment_method: String,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TableOrderRequest {
    pub table_id: Option<Uuid>,
    pub qr_identifier: Option<String>,
    /// Defaults to `qr_code` when ordering through a QR identifier and to
    /// `staff` otherwise.
    pub order_type: Option<String>,
    pub lines: Vec<OrderLineRequest>,
    pub payment_method: String,
    pub promo_code: Option<String>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    pub order_id: Uuid,
    pub new_status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemsRequest {
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestaurantOrdersParams {
    /// Only orders that are neither delivered nor cancelled.
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            menu_item_id: item.menu_item_id,
            quantity: item.quantity,
            unit_price: format_money(&item.unit_price),
            line_total: format_money(&item.line_total()),
            notes: item.notes.clone(),
            created_at: item.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModificationResponse {
    pub actor: Uuid,
    pub timestamp: String,
    pub change: String,
}

impl From<&ModificationEntry> for ModificationResponse {
    fn from(entry: &ModificationEntry) -> Self {
        Self {
            actor: entry.actor,
            timestamp: entry.timestamp.to_rfc3339(),
            change: entry.change.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub table_id: Option<Uuid>,
    pub order_type: String,
    pub status: String,
    /// Statuses this order may move to next.
    pub next_statuses: Vec<String>,
    pub payment_method: String,
    pub payment_status: String,
    pub applied_promo_code: Option<AppliedPromoResponse>,
    pub subtotal: String,
    pub discount_amount: String,
    pub delivery_charge: String,
    pub total: String,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
    pub modification_log: Vec<ModificationResponse>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            restaurant_id: order.restaurant_id,
            table_id: order.table_id,
            order_type: order.order_type.as_str().to_string(),
            status: order.status.as_str().to_string(),
            next_statuses: next_statuses(order.order_type, order.status)
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            payment_method: order.payment_method.as_str().to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            applied_promo_code: order.applied_promo.as_ref().map(AppliedPromoResponse::from),
            subtotal: format_money(&order.subtotal),
            discount_amount: format_money(&order.discount_amount),
            delivery_charge: format_money(&order.delivery_charge),
            total: format_money(&order.total),
            delivery_address: order.delivery_address.clone(),
            special_instructions: order.special_instructions.clone(),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
            items: order.items.iter().map(OrderItemResponse::from).collect(),
            modification_log: order
                .modification_log
                .iter()
                .map(ModificationResponse::from)
                .collect(),
        }
    }
}

// ── Tables ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct TableStatusParams {
    pub restaurant_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TableStatusResponse {
    pub table_id: Uuid,
    pub table_number: i32,
    pub capacity: i32,
    /// `available` or `occupied`.
    pub status: String,
    pub active_order_ids: Vec<Uuid>,
    pub last_computed_at: String,
}

impl From<&TableOccupancy> for TableStatusResponse {
    fn from(t: &TableOccupancy) -> Self {
        Self {
            table_id: t.table.id,
            table_number: t.table.table_number,
            capacity: t.table.capacity,
            status: t.status.as_str().to_string(),
            active_order_ids: t.active_order_ids.clone(),
            last_computed_at: t.last_computed_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RestaurantTablesResponse {
    pub restaurant_id: Uuid,
    pub last_computed_at: String,
    /// Suggested delay before the next poll.
    pub poll_interval_secs: u64,
    pub tables: Vec<TableStatusResponse>,
}

impl From<&TableStatusReport> for RestaurantTablesResponse {
    fn from(report: &TableStatusReport) -> Self {
        Self {
            restaurant_id: report.restaurant_id,
            last_computed_at: report.last_computed_at.to_rfc3339(),
            poll_interval_secs: report.poll_interval.as_secs(),
            tables: report.tables.iter().map(TableStatusResponse::from).collect(),
        }
    }
}
