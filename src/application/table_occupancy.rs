use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::{OrderRepository, TableRepository};
use crate::domain::table::{derive_occupancy, TableOccupancy};

/// Occupancy of a restaurant's tables at one instant. Callers poll; the
/// answer is at most `poll_interval` old by the time they poll again.
#[derive(Debug, Clone)]
pub struct TableStatusReport {
    pub restaurant_id: Uuid,
    pub last_computed_at: DateTime<Utc>,
    pub poll_interval: Duration,
    pub tables: Vec<TableOccupancy>,
}

pub struct TableOccupancyView {
    tables: Arc<dyn TableRepository>,
    orders: Arc<dyn OrderRepository>,
    poll_interval: Duration,
}

impl TableOccupancyView {
    pub fn new(
        tables: Arc<dyn TableRepository>,
        orders: Arc<dyn OrderRepository>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            tables,
            orders,
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn status(&self, table_id: Uuid) -> Result<TableOccupancy, DomainError> {
        let table = self
            .tables
            .find_table(table_id)?
            .ok_or(DomainError::NotFound("Table"))?;
        let orders = self.orders.table_orders(table.restaurant_id)?;
        Ok(derive_occupancy(&table, &orders, Utc::now()))
    }

    /// Active tables of the restaurant, ordered by table number.
    pub fn restaurant_status(&self, restaurant_id: Uuid) -> Result<TableStatusReport, DomainError> {
        let mut tables = self.tables.list_tables(restaurant_id)?;
        tables.retain(|t| t.is_active);
        tables.sort_by_key(|t| t.table_number);
        let orders = self.orders.table_orders(restaurant_id)?;
        let now = Utc::now();

        Ok(TableStatusReport {
            restaurant_id,
            last_computed_at: now,
            poll_interval: self.poll_interval,
            tables: tables
                .iter()
                .map(|t| derive_occupancy(t, &orders, now))
                .collect(),
        })
    }
}
