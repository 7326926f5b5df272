use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::errors::DomainError;
use super::menu::MenuItem;

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub menu_item_id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub quantity: i32,
    /// Price captured when the item was first added.
    pub unit_price: BigDecimal,
    pub notes: Option<String>,
}

impl CartLine {
    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * &BigDecimal::from(self.quantity)
    }
}

/// A session's cart with an optimistic version counter.
///
/// Every successful mutation bumps `version` by exactly one. Mutations carry
/// the version the caller last read and are rejected with
/// [`DomainError::StaleVersion`] when it no longer matches, leaving the cart
/// untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
    version: u64,
}

impl Cart {
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Lines in the order they were first added.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn restaurant_id(&self) -> Option<Uuid> {
        self.lines.first().map(|l| l.restaurant_id)
    }

    pub fn line(&self, menu_item_id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.menu_item_id == menu_item_id)
    }

    pub fn subtotal(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::zero(), |acc, l| acc + l.line_total())
    }

    pub fn add(
        &mut self,
        item: &MenuItem,
        quantity: i32,
        notes: Option<String>,
        expected_version: u64,
    ) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity);
        }
        self.check_version(expected_version)?;
        if !item.is_available {
            return Err(DomainError::ItemUnavailable(item.id));
        }
        if let Some(restaurant_id) = self.restaurant_id() {
            if restaurant_id != item.restaurant_id {
                return Err(DomainError::InvalidInput(
                    "Cart already contains items from another restaurant".to_string(),
                ));
            }
        }

        match self.lines.iter_mut().find(|l| l.menu_item_id == item.id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(DomainError::InvalidQuantity)?;
                if notes.is_some() {
                    line.notes = notes;
                }
            }
            None => self.lines.push(CartLine {
                menu_item_id: item.id,
                restaurant_id: item.restaurant_id,
                name: item.name.clone(),
                quantity,
                unit_price: item.price.clone(),
                notes,
            }),
        }
        self.version += 1;
        Ok(())
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn update_quantity(
        &mut self,
        menu_item_id: Uuid,
        quantity: i32,
        expected_version: u64,
    ) -> Result<(), DomainError> {
        if quantity < 0 {
            return Err(DomainError::InvalidQuantity);
        }
        if quantity == 0 {
            return self.remove(menu_item_id, expected_version);
        }
        self.check_version(expected_version)?;
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.menu_item_id == menu_item_id)
            .ok_or(DomainError::NotFound("Cart item"))?;
        line.quantity = quantity;
        self.version += 1;
        Ok(())
    }

    pub fn remove(&mut self, menu_item_id: Uuid, expected_version: u64) -> Result<(), DomainError> {
        self.check_version(expected_version)?;
        let before = self.lines.len();
        self.lines.retain(|l| l.menu_item_id != menu_item_id);
        if self.lines.len() == before {
            return Err(DomainError::NotFound("Cart item"));
        }
        self.version += 1;
        Ok(())
    }

    /// Empties the cart after checkout. Counts as a mutation.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.version += 1;
    }

    fn check_version(&self, expected: u64) -> Result<(), DomainError> {
        if expected != self.version {
            return Err(DomainError::StaleVersion {
                expected,
                current: self.version,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn item(price: &str) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::nil(),
            name: "Paneer Tikka".to_string(),
            price: BigDecimal::from_str(price).expect("valid decimal"),
            is_available: true,
        }
    }

    #[test]
    fn version_increases_by_one_per_successful_mutation() {
        let mut cart = Cart::default();
        let a = item("199.00");
        let b = item("99.50");

        cart.add(&a, 1, None, 0).expect("add a");
        assert_eq!(cart.version(), 1);
        cart.add(&b, 2, None, 1).expect("add b");
        assert_eq!(cart.version(), 2);
        cart.update_quantity(a.id, 3, 2).expect("update a");
        assert_eq!(cart.version(), 3);
        cart.remove(b.id, 3).expect("remove b");
        assert_eq!(cart.version(), 4);
    }

    #[test]
    fn stale_version_is_rejected_and_leaves_cart_unchanged() {
        let mut cart = Cart::default();
        let a = item("100.00");
        cart.add(&a, 1, None, 0).expect("add");
        let before = cart.clone();

        let err = cart.update_quantity(a.id, 5, 0).unwrap_err();

        assert!(matches!(
            err,
            DomainError::StaleVersion {
                expected: 0,
                current: 1
            }
        ));
        assert_eq!(cart, before);
    }

    #[test]
    fn adding_same_item_keeps_first_price_snapshot() {
        let mut cart = Cart::default();
        let mut a = item("100.00");
        cart.add(&a, 1, None, 0).expect("add");
        a.price = BigDecimal::from(120);
        cart.add(&a, 2, None, 1).expect("add again");

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.subtotal(), BigDecimal::from(300));
    }

    #[test]
    fn zero_quantity_update_removes_line() {
        let mut cart = Cart::default();
        let a = item("10.00");
        cart.add(&a, 1, None, 0).expect("add");

        cart.update_quantity(a.id, 0, 1).expect("update");

        assert!(cart.is_empty());
        assert_eq!(cart.version(), 2);
    }

    #[test]
    fn rejects_non_positive_quantity_and_unavailable_items() {
        let mut cart = Cart::default();
        let mut a = item("10.00");
        assert!(matches!(
            cart.add(&a, 0, None, 0),
            Err(DomainError::InvalidQuantity)
        ));
        assert!(matches!(
            cart.update_quantity(a.id, -1, 0),
            Err(DomainError::InvalidQuantity)
        ));
        a.is_available = false;
        assert!(matches!(
            cart.add(&a, 1, None, 0),
            Err(DomainError::ItemUnavailable(_))
        ));
        assert_eq!(cart.version(), 0);
    }

    #[test]
    fn rejects_items_from_a_second_restaurant() {
        let mut cart = Cart::default();
        cart.add(&item("10.00"), 1, None, 0).expect("add");
        let mut other = item("12.00");
        other.restaurant_id = Uuid::new_v4();

        assert!(matches!(
            cart.add(&other, 1, None, 1),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
