use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderChange, OrderEventType, OrderStatus};
use crate::domain::ports::{OrderRepository, PromoRedemption};
use crate::domain::table::TableOrderRef;
use crate::schema::{order_items, order_modifications, order_outbox, orders};

use super::models::{
    ModificationRow, NewModificationRow, NewOrderItemRow, NewOrderRow, NewOutboxEventRow,
    OrderChangeset, OrderItemRow, OrderRow,
};
use super::order_event_payload;
use super::promo_repo::consume_in;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Row helpers ──────────────────────────────────────────────────────────────

/// Attaches items and modification history to each header row, preserving
/// the order of `rows`.
fn hydrate(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
    let items = OrderItemRow::belonging_to(&rows)
        .select(OrderItemRow::as_select())
        .order(order_items::created_at.asc())
        .load(conn)?
        .grouped_by(&rows);
    let modifications = ModificationRow::belonging_to(&rows)
        .select(ModificationRow::as_select())
        .order(order_modifications::created_at.asc())
        .load(conn)?
        .grouped_by(&rows);

    rows.into_iter()
        .zip(items)
        .zip(modifications)
        .map(|((row, items), mods)| row.into_order(items, mods))
        .collect()
}

fn write_outbox(
    conn: &mut PgConnection,
    order: &Order,
    event: OrderEventType,
) -> Result<(), DomainError> {
    diesel::insert_into(order_outbox::table)
        .values(&NewOutboxEventRow {
            id: Uuid::new_v4(),
            aggregate_type: "Order".to_string(),
            aggregate_id: order.id.to_string(),
            event_type: event.as_str().to_string(),
            payload: order_event_payload(order, event),
        })
        .execute(conn)?;
    Ok(())
}

fn terminal_statuses() -> Vec<&'static str> {
    OrderStatus::TERMINAL.iter().map(|s| s.as_str()).collect()
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create(&self, order: &Order, redemption: Option<&PromoRedemption>) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            if let Some(redemption) = redemption {
                consume_in(conn, redemption)?;
            }

            diesel::insert_into(orders::table)
                .values(&NewOrderRow::from(order))
                .execute(conn)?;

            let items: Vec<NewOrderItemRow> = order.items.iter().map(NewOrderItemRow::from).collect();
            diesel::insert_into(order_items::table)
                .values(&items)
                .execute(conn)?;

            write_outbox(conn, order, OrderEventType::Created)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(hydrate(&mut conn, vec![row])?.pop())
    }

    fn update(
        &self,
        id: Uuid,
        change: &mut dyn FnMut(&mut Order) -> Result<OrderChange, DomainError>,
    ) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Row lock: concurrent updates of the same order queue up here.
            let row = orders::table
                .filter(orders::id.eq(id))
                .select(OrderRow::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(DomainError::NotFound("Order"))?;

            let mut order = hydrate(conn, vec![row])?
                .pop()
                .ok_or(DomainError::NotFound("Order"))?;
            let applied = change(&mut order)?;

            diesel::update(orders::table.filter(orders::id.eq(id)))
                .set(&OrderChangeset::from(&order))
                .execute(conn)?;

            if !applied.new_items.is_empty() {
                let items: Vec<NewOrderItemRow> =
                    applied.new_items.iter().map(NewOrderItemRow::from).collect();
                diesel::insert_into(order_items::table)
                    .values(&items)
                    .execute(conn)?;
            }

            diesel::insert_into(order_modifications::table)
                .values(&NewModificationRow {
                    id: Uuid::new_v4(),
                    order_id: id,
                    actor_id: applied.entry.actor,
                    change: applied.entry.change.clone(),
                    created_at: applied.entry.timestamp,
                })
                .execute(conn)?;

            write_outbox(conn, &order, applied.event)?;
            Ok(order)
        })
    }

    fn list_for_restaurant(
        &self,
        restaurant_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = orders::table
            .filter(orders::restaurant_id.eq(restaurant_id))
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .into_boxed();
        if active_only {
            query = query.filter(orders::status.ne_all(terminal_statuses()));
        }
        let rows = query.load(&mut conn)?;
        hydrate(&mut conn, rows)
    }

    fn table_orders(&self, restaurant_id: Uuid) -> Result<Vec<TableOrderRef>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows: Vec<(Uuid, Option<Uuid>, String)> = orders::table
            .filter(orders::restaurant_id.eq(restaurant_id))
            .filter(orders::table_id.is_not_null())
            .filter(orders::status.ne_all(terminal_statuses()))
            .select((orders::id, orders::table_id, orders::status))
            .load(&mut conn)?;

        rows.into_iter()
            .filter_map(|(order_id, table_id, status)| {
                table_id.map(|table_id| (order_id, table_id, status))
            })
            .map(|(order_id, table_id, status)| {
                Ok(TableOrderRef {
                    order_id,
                    table_id,
                    status: status.parse()?,
                })
            })
            .collect()
    }

    fn count_for_user(&self, user_id: Uuid) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;

        let count = orders::table
            .filter(orders::user_id.eq(user_id))
            .filter(orders::status.ne(OrderStatus::Cancelled.as_str()))
            .count()
            .get_result(&mut conn)?;
        Ok(count)
    }
}
