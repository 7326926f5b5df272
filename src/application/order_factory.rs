use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::errors::DomainError;
use crate::domain::money::round_money;
use crate::domain::order::{Order, OrderItem, OrderStatus, OrderType, PaymentMethod, PaymentStatus};
use crate::domain::ports::{
    DeliveryFeeProvider, MenuCatalog, OrderRepository, PromoRedemption, TableRepository,
};
use crate::domain::table::RestaurantTable;

use super::cart_store::CartStore;
use super::promo_engine::PromoCodeEngine;

/// Where and how the order is fulfilled.
#[derive(Debug, Clone)]
pub struct Fulfillment {
    pub order_type: OrderType,
    pub table_id: Option<Uuid>,
    /// Alternative to `table_id` for QR-code orders.
    pub qr_identifier: Option<String>,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LineRequest {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

pub struct OrderFactory {
    catalog: Arc<dyn MenuCatalog>,
    tables: Arc<dyn TableRepository>,
    orders: Arc<dyn OrderRepository>,
    fees: Arc<dyn DeliveryFeeProvider>,
    promos: Arc<PromoCodeEngine>,
    carts: Arc<CartStore>,
}

impl OrderFactory {
    pub fn new(
        catalog: Arc<dyn MenuCatalog>,
        tables: Arc<dyn TableRepository>,
        orders: Arc<dyn OrderRepository>,
        fees: Arc<dyn DeliveryFeeProvider>,
        promos: Arc<PromoCodeEngine>,
        carts: Arc<CartStore>,
    ) -> Self {
        Self {
            catalog,
            tables,
            orders,
            fees,
            promos,
            carts,
        }
    }

    /// Turns the session's cart into an order. The cart is cleared only once
    /// the order (and any promo consumption) has been committed.
    pub fn checkout(
        &self,
        session_id: &str,
        user_id: Uuid,
        fulfillment: &Fulfillment,
        payment_method: PaymentMethod,
    ) -> Result<Order, DomainError> {
        self.carts.checkout(session_id, |ctx| {
            self.create(
                &ctx.cart,
                ctx.applied_promo.as_deref(),
                user_id,
                fulfillment,
                payment_method,
            )
        })
    }

    /// Places an order for a table from explicit lines, as staff do at the
    /// counter or a guest does through the table's QR code.
    pub fn create_table_order(
        &self,
        user_id: Uuid,
        fulfillment: &Fulfillment,
        lines: &[LineRequest],
        payment_method: PaymentMethod,
        promo_code: Option<&str>,
    ) -> Result<Order, DomainError> {
        if !fulfillment.order_type.is_table_order() {
            return Err(DomainError::InvalidInput(format!(
                "{} is not a table order type",
                fulfillment.order_type
            )));
        }
        let mut cart = Cart::default();
        for line in lines {
            let item = self
                .catalog
                .find_menu_item(line.menu_item_id)?
                .ok_or(DomainError::ItemUnavailable(line.menu_item_id))?;
            let version = cart.version();
            cart.add(&item, line.quantity, line.notes.clone(), version)?;
        }
        self.create(&cart, promo_code, user_id, fulfillment, payment_method)
    }

    pub fn create(
        &self,
        cart: &Cart,
        promo_code: Option<&str>,
        user_id: Uuid,
        fulfillment: &Fulfillment,
        payment_method: PaymentMethod,
    ) -> Result<Order, DomainError> {
        let restaurant_id = cart.restaurant_id().ok_or(DomainError::CartEmpty)?;
        self.ensure_cart_current(cart)?;
        let table = self.resolve_table(restaurant_id, fulfillment)?;

        let subtotal = round_money(&cart.subtotal());
        let mut delivery_charge = match fulfillment.order_type {
            OrderType::Delivery => self
                .fees
                .delivery_charge(restaurant_id, fulfillment.delivery_address.as_deref())?,
            _ => BigDecimal::zero(),
        };

        let promo = promo_code
            .map(|code| self.promos.validate_for_user(code, &subtotal, restaurant_id, user_id))
            .transpose()?;
        let discount_amount = match &promo {
            Some(p) => {
                let discount = p.compute_discount(&subtotal);
                if discount.free_delivery {
                    delivery_charge = BigDecimal::zero();
                }
                discount.amount
            }
            None => BigDecimal::zero(),
        };

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let items = cart
            .lines()
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4(),
                order_id,
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                unit_price: line.unit_price.clone(),
                notes: line.notes.clone(),
                created_at: now,
            })
            .collect();
        let mut order = Order {
            id: order_id,
            user_id,
            restaurant_id,
            table_id: table.map(|t| t.id),
            order_type: fulfillment.order_type,
            status: OrderStatus::Pending,
            payment_method,
            payment_status: PaymentStatus::Pending,
            applied_promo: promo.as_ref().map(|p| p.snapshot()),
            subtotal,
            discount_amount,
            delivery_charge,
            total: BigDecimal::zero(),
            delivery_address: fulfillment.delivery_address.clone(),
            special_instructions: fulfillment.special_instructions.clone(),
            created_at: now,
            updated_at: now,
            items,
            modification_log: Vec::new(),
        };
        order.recompute_totals();

        let redemption = promo.as_ref().map(|p| PromoRedemption {
            promo_id: p.id,
            user_id,
        });
        match self.orders.create(&order, redemption.as_ref()) {
            Ok(()) => {}
            Err(DomainError::LimitRace) => {
                log::info!(
                    "Promo code {} exhausted by a concurrent checkout; order not created",
                    promo.as_ref().map(|p| p.code.as_str()).unwrap_or_default()
                );
                return Err(DomainError::LimitRace);
            }
            Err(e) => return Err(e),
        }

        log::info!(
            "Created {} order {} for restaurant {} (total {})",
            order.order_type,
            order.id,
            order.restaurant_id,
            order.total
        );
        Ok(order)
    }

    /// Every line must still exist, be available, and cost what it cost when
    /// it was added. Otherwise the client has to refresh instead of being
    /// silently re-priced.
    fn ensure_cart_current(&self, cart: &Cart) -> Result<(), DomainError> {
        for line in cart.lines() {
            let current = self.catalog.find_menu_item(line.menu_item_id)?;
            let fresh = matches!(
                &current,
                Some(item) if item.is_available && item.price == line.unit_price
            );
            if !fresh {
                log::info!("Cart line {} is stale", line.menu_item_id);
                return Err(DomainError::CartStale(line.menu_item_id));
            }
        }
        Ok(())
    }

    fn resolve_table(
        &self,
        restaurant_id: Uuid,
        fulfillment: &Fulfillment,
    ) -> Result<Option<RestaurantTable>, DomainError> {
        match fulfillment.order_type {
            OrderType::Delivery => {
                let has_address = fulfillment
                    .delivery_address
                    .as_deref()
                    .is_some_and(|a| !a.trim().is_empty());
                if !has_address {
                    return Err(DomainError::InvalidInput(
                        "delivery orders need a delivery address".to_string(),
                    ));
                }
                Ok(None)
            }
            OrderType::Takeaway => Ok(None),
            OrderType::DineIn | OrderType::QrCode | OrderType::Staff => {
                let table = match (fulfillment.table_id, fulfillment.qr_identifier.as_deref()) {
                    (Some(id), _) => self.tables.find_table(id)?,
                    (None, Some(qr)) => self.tables.find_table_by_qr(qr)?,
                    (None, None) => {
                        return Err(DomainError::InvalidInput(format!(
                            "{} orders need a table",
                            fulfillment.order_type
                        )))
                    }
                };
                let table = table
                    .filter(|t| t.is_active && t.restaurant_id == restaurant_id)
                    .ok_or(DomainError::NotFound("Table"))?;
                Ok(Some(table))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::thread;

    use chrono::Duration;

    use super::*;
    use crate::application::cart_store::CartUpdate;
    use crate::domain::menu::MenuItem;
    use crate::domain::promo::{DiscountType, PromoCode, PromoRejection};
    use crate::infrastructure::delivery_fee::FlatDeliveryFee;
    use crate::infrastructure::memory::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        carts: Arc<CartStore>,
        factory: Arc<OrderFactory>,
        item: MenuItem,
        table: RestaurantTable,
    }

    fn fixture(price: &str) -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let restaurant_id = Uuid::new_v4();
        let item = MenuItem {
            id: Uuid::new_v4(),
            restaurant_id,
            name: "Biryani".to_string(),
            price: BigDecimal::from_str(price).expect("valid decimal"),
            is_available: true,
        };
        store.insert_menu_item(item.clone());
        let table = RestaurantTable {
            id: Uuid::new_v4(),
            restaurant_id,
            table_number: 7,
            capacity: 4,
            qr_identifier: "qr-7".to_string(),
            is_active: true,
        };
        store.insert_table(table.clone());

        let fees: Arc<dyn DeliveryFeeProvider> = Arc::new(FlatDeliveryFee::new(BigDecimal::from(40)));
        let carts = Arc::new(CartStore::new(store.clone()));
        let promos = Arc::new(PromoCodeEngine::new(
            store.clone(),
            store.clone(),
            fees.clone(),
            carts.clone(),
        ));
        let factory = Arc::new(OrderFactory::new(
            store.clone(),
            store.clone(),
            store.clone(),
            fees,
            promos,
            carts.clone(),
        ));
        Fixture {
            store,
            carts,
            factory,
            item,
            table,
        }
    }

    fn promo(code: &str, discount_type: DiscountType, value: i32) -> PromoCode {
        let now = Utc::now();
        PromoCode {
            id: Uuid::new_v4(),
            code: code.to_string(),
            discount_type,
            discount_value: BigDecimal::from(value),
            minimum_order_amount: BigDecimal::zero(),
            max_discount_amount: None,
            usage_limit: None,
            usage_limit_per_user: None,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            restaurant_id: None,
            first_time_only: false,
            is_active: true,
            times_used: 0,
        }
    }

    fn delivery() -> Fulfillment {
        Fulfillment {
            order_type: OrderType::Delivery,
            table_id: None,
            qr_identifier: None,
            delivery_address: Some("12 MG Road".to_string()),
            special_instructions: None,
        }
    }

    fn dine_in(table_id: Uuid) -> Fulfillment {
        Fulfillment {
            order_type: OrderType::DineIn,
            table_id: Some(table_id),
            qr_identifier: None,
            delivery_address: None,
            special_instructions: None,
        }
    }

    fn fill_cart(f: &Fixture, session: &str, quantity: i32) {
        let update = f.carts.add(session, f.item.id, quantity, None, 0).expect("add");
        assert!(matches!(update, CartUpdate::Applied(_)));
    }

    #[test]
    fn percentage_promo_is_capped_in_created_order() {
        let f = fixture("100.00");
        let mut p = promo("TWENTY", DiscountType::Percentage, 20);
        p.max_discount_amount = Some(BigDecimal::from(50));
        f.store.insert_promo(p);
        fill_cart(&f, "s1", 10);
        f.carts
            .with_session("s1", |ctx| {
                ctx.applied_promo = Some("TWENTY".to_string());
                Ok(())
            })
            .expect("attach promo");

        let order = f
            .factory
            .checkout("s1", Uuid::new_v4(), &delivery(), PaymentMethod::Cod)
            .expect("checkout");

        assert_eq!(order.subtotal, BigDecimal::from(1000));
        assert_eq!(order.discount_amount, BigDecimal::from(50));
        assert_eq!(order.delivery_charge, BigDecimal::from(40));
        assert_eq!(order.total, BigDecimal::from(990));
        assert_eq!(f.store.promo("TWENTY").expect("promo").times_used, 1);
        assert!(f.carts.snapshot("s1").cart.is_empty());
    }

    #[test]
    fn table_orders_have_no_delivery_charge() {
        let f = fixture("250.00");
        fill_cart(&f, "s1", 2);

        let order = f
            .factory
            .checkout("s1", Uuid::new_v4(), &dine_in(f.table.id), PaymentMethod::Cod)
            .expect("checkout");

        assert_eq!(order.table_id, Some(f.table.id));
        assert_eq!(order.delivery_charge, BigDecimal::zero());
        assert_eq!(order.total, BigDecimal::from(500));
    }

    #[test]
    fn repriced_item_makes_cart_stale_and_leaves_cart_untouched() {
        let f = fixture("250.00");
        fill_cart(&f, "s1", 1);
        let mut repriced = f.item.clone();
        repriced.price = BigDecimal::from(275);
        f.store.insert_menu_item(repriced);

        let err = f
            .factory
            .checkout("s1", Uuid::new_v4(), &delivery(), PaymentMethod::Online)
            .unwrap_err();

        assert!(matches!(err, DomainError::CartStale(_)));
        assert_eq!(f.carts.snapshot("s1").cart.lines().len(), 1);
        assert!(f.store.orders_snapshot().is_empty());
    }

    #[test]
    fn empty_cart_cannot_be_checked_out() {
        let f = fixture("10.00");
        let err = f
            .factory
            .checkout("s1", Uuid::new_v4(), &delivery(), PaymentMethod::Cod)
            .unwrap_err();
        assert!(matches!(err, DomainError::CartEmpty));
    }

    #[test]
    fn invalid_promo_aborts_without_consuming() {
        let f = fixture("50.00");
        let mut p = promo("MIN100", DiscountType::Fixed, 10);
        p.minimum_order_amount = BigDecimal::from(100);
        f.store.insert_promo(p);
        fill_cart(&f, "s1", 1);
        f.carts
            .with_session("s1", |ctx| {
                ctx.applied_promo = Some("MIN100".to_string());
                Ok(())
            })
            .expect("attach promo");

        let err = f
            .factory
            .checkout("s1", Uuid::new_v4(), &delivery(), PaymentMethod::Cod)
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::Promo(PromoRejection::BelowMinimum { .. })
        ));
        assert_eq!(err.to_string(), "Minimum order amount of 100.00 required.");
        assert_eq!(f.carts.snapshot("s1").cart.lines().len(), 1);
    }

    #[test]
    fn qr_orders_resolve_table_by_identifier() {
        let f = fixture("80.00");
        let fulfillment = Fulfillment {
            order_type: OrderType::QrCode,
            table_id: None,
            qr_identifier: Some("qr-7".to_string()),
            delivery_address: None,
            special_instructions: Some("no onions".to_string()),
        };
        let lines = [LineRequest {
            menu_item_id: f.item.id,
            quantity: 3,
            notes: None,
        }];

        let order = f
            .factory
            .create_table_order(Uuid::new_v4(), &fulfillment, &lines, PaymentMethod::Cod, None)
            .expect("create");

        assert_eq!(order.table_id, Some(f.table.id));
        assert_eq!(order.total, BigDecimal::from(240));
        assert_eq!(order.items.len(), 1);
    }

    #[test]
    fn delivery_needs_address_and_table_orders_need_table() {
        let f = fixture("80.00");
        fill_cart(&f, "s1", 1);
        let mut no_address = delivery();
        no_address.delivery_address = Some("  ".to_string());
        assert!(matches!(
            f.factory
                .checkout("s1", Uuid::new_v4(), &no_address, PaymentMethod::Cod),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            f.factory
                .checkout("s1", Uuid::new_v4(), &dine_in(Uuid::new_v4()), PaymentMethod::Cod),
            Err(DomainError::NotFound("Table"))
        ));
    }

    #[test]
    fn concurrent_checkouts_never_over_redeem() {
        const ATTEMPTS: usize = 12;
        const LIMIT: i32 = 3;

        let f = fixture("100.00");
        let mut p = promo("LAST3", DiscountType::Fixed, 20);
        p.usage_limit = Some(LIMIT);
        f.store.insert_promo(p);
        for i in 0..ATTEMPTS {
            fill_cart(&f, &format!("s{i}"), 1);
            f.carts
                .with_session(&format!("s{i}"), |ctx| {
                    ctx.applied_promo = Some("LAST3".to_string());
                    Ok(())
                })
                .expect("attach promo");
        }

        let handles: Vec<_> = (0..ATTEMPTS)
            .map(|i| {
                let factory = f.factory.clone();
                thread::spawn(move || {
                    factory.checkout(&format!("s{i}"), Uuid::new_v4(), &delivery(), PaymentMethod::Cod)
                })
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let limited = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(DomainError::LimitRace)
                        | Err(DomainError::Promo(PromoRejection::UsageLimitReached))
                )
            })
            .count();
        assert_eq!(succeeded, LIMIT as usize);
        assert_eq!(limited, ATTEMPTS - LIMIT as usize);
        assert_eq!(f.store.promo("LAST3").expect("promo").times_used, LIMIT);
        assert_eq!(f.store.orders_snapshot().len(), LIMIT as usize);
    }
}
