use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::menu::MenuItem;
use crate::domain::ports::{MenuCatalog, TableRepository};
use crate::domain::table::RestaurantTable;
use crate::schema::{menu_items, restaurant_tables};

use super::models::{MenuItemRow, NewMenuItemRow, TableRow};

/// Read access to menu items and restaurant tables. Both are owned by other
/// services; the write methods exist for seeding.
pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn upsert_menu_item(&self, item: &MenuItem) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let row = NewMenuItemRow {
            id: item.id,
            restaurant_id: item.restaurant_id,
            name: item.name.clone(),
            price: item.price.clone(),
            is_available: item.is_available,
        };
        diesel::insert_into(menu_items::table)
            .values(&row)
            .on_conflict(menu_items::id)
            .do_update()
            .set((
                menu_items::name.eq(&row.name),
                menu_items::price.eq(&row.price),
                menu_items::is_available.eq(row.is_available),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn insert_table(&self, table: &RestaurantTable) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(restaurant_tables::table)
            .values(&TableRow::from(table))
            .execute(&mut conn)?;
        Ok(())
    }
}

impl MenuCatalog for DieselCatalogRepository {
    fn find_menu_item(&self, id: Uuid) -> Result<Option<MenuItem>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = menu_items::table
            .filter(menu_items::id.eq(id))
            .select(MenuItemRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(MenuItem::from))
    }
}

impl TableRepository for DieselCatalogRepository {
    fn find_table(&self, id: Uuid) -> Result<Option<RestaurantTable>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = restaurant_tables::table
            .filter(restaurant_tables::id.eq(id))
            .select(TableRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(RestaurantTable::from))
    }

    fn find_table_by_qr(&self, qr_identifier: &str) -> Result<Option<RestaurantTable>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = restaurant_tables::table
            .filter(restaurant_tables::qr_identifier.eq(qr_identifier))
            .select(TableRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(RestaurantTable::from))
    }

    fn list_tables(&self, restaurant_id: Uuid) -> Result<Vec<RestaurantTable>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = restaurant_tables::table
            .filter(restaurant_tables::restaurant_id.eq(restaurant_id))
            .order(restaurant_tables::table_number.asc())
            .select(TableRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(RestaurantTable::from).collect())
    }
}
