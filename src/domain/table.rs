use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::order::OrderStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantTable {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub table_number: i32,
    pub capacity: i32,
    /// Opaque token printed in the table's QR code.
    pub qr_identifier: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Available,
    Occupied,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "available",
            TableStatus::Occupied => "occupied",
        }
    }
}

/// An order that references a table, as seen by the occupancy projection.
#[derive(Debug, Clone, PartialEq)]
pub struct TableOrderRef {
    pub order_id: Uuid,
    pub table_id: Uuid,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableOccupancy {
    pub table: RestaurantTable,
    pub status: TableStatus,
    pub active_order_ids: Vec<Uuid>,
    pub last_computed_at: DateTime<Utc>,
}

/// Occupancy is never stored: a table is occupied exactly while some order
/// referencing it is not yet delivered or cancelled.
pub fn derive_occupancy(
    table: &RestaurantTable,
    orders: &[TableOrderRef],
    now: DateTime<Utc>,
) -> TableOccupancy {
    let active_order_ids: Vec<Uuid> = orders
        .iter()
        .filter(|o| o.table_id == table.id && !o.status.is_terminal())
        .map(|o| o.order_id)
        .collect();
    let status = if active_order_ids.is_empty() {
        TableStatus::Available
    } else {
        TableStatus::Occupied
    };
    TableOccupancy {
        table: table.clone(),
        status,
        active_order_ids,
        last_computed_at: now,
    }
}
