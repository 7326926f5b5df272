use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::errors::DomainError;
use super::menu::MenuItem;
use super::order::{Order, OrderChange};
use super::promo::PromoCode;
use super::table::{RestaurantTable, TableOrderRef};

/// Menu prices and availability, owned by the menu service.
pub trait MenuCatalog: Send + Sync + 'static {
    fn find_menu_item(&self, id: Uuid) -> Result<Option<MenuItem>, DomainError>;
}

pub trait TableRepository: Send + Sync + 'static {
    fn find_table(&self, id: Uuid) -> Result<Option<RestaurantTable>, DomainError>;
    fn find_table_by_qr(&self, qr_identifier: &str) -> Result<Option<RestaurantTable>, DomainError>;
    fn list_tables(&self, restaurant_id: Uuid) -> Result<Vec<RestaurantTable>, DomainError>;
}

/// A promo redemption to record together with the order that uses it.
#[derive(Debug, Clone, PartialEq)]
pub struct PromoRedemption {
    pub promo_id: Uuid,
    pub user_id: Uuid,
}

pub trait PromoCodeRepository: Send + Sync + 'static {
    /// Case-insensitive exact match.
    fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError>;
    fn user_redemptions(&self, promo_id: Uuid, user_id: Uuid) -> Result<i32, DomainError>;
    /// Increments the global and per-user counters as one atomic
    /// check-and-increment. Fails with [`DomainError::LimitRace`] when either
    /// limit is already exhausted.
    fn consume(&self, redemption: &PromoRedemption) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Persists the order, its items and creation event. When a redemption is
    /// given it is consumed in the same unit: either both commit or neither.
    fn create(&self, order: &Order, redemption: Option<&PromoRedemption>)
        -> Result<(), DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    /// Loads the order under its per-order lock, applies `change`, and
    /// persists the result only if `change` succeeds.
    fn update(
        &self,
        id: Uuid,
        change: &mut dyn FnMut(&mut Order) -> Result<OrderChange, DomainError>,
    ) -> Result<Order, DomainError>;
    fn list_for_restaurant(
        &self,
        restaurant_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<Order>, DomainError>;
    fn table_orders(&self, restaurant_id: Uuid) -> Result<Vec<TableOrderRef>, DomainError>;
    /// Orders placed by the user that were not cancelled.
    fn count_for_user(&self, user_id: Uuid) -> Result<i64, DomainError>;
}

/// Delivery fee collaborator. `address` is `None` when quoting a cart before
/// the customer has chosen where to deliver.
pub trait DeliveryFeeProvider: Send + Sync + 'static {
    fn delivery_charge(
        &self,
        restaurant_id: Uuid,
        address: Option<&str>,
    ) -> Result<BigDecimal, DomainError>;
}
