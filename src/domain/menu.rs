use bigdecimal::BigDecimal;
use uuid::Uuid;

/// Read-only view of a menu item, owned by the menu management service.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub is_available: bool,
}
