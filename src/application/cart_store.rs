use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::domain::errors::DomainError;
use crate::domain::ports::MenuCatalog;

/// Per-session state that lives between requests: the cart and the promo
/// code the customer attached to it.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub cart: Cart,
    pub applied_promo: Option<String>,
}

impl SessionContext {
    /// Nothing was ever added, so there is nothing worth keeping.
    fn is_pristine(&self) -> bool {
        self.cart.version() == 0 && self.applied_promo.is_none()
    }
}

#[derive(Debug)]
struct SessionSlot {
    ctx: SessionContext,
    touched: Instant,
}

impl Default for SessionSlot {
    fn default() -> Self {
        Self {
            ctx: SessionContext::default(),
            touched: Instant::now(),
        }
    }
}

/// Result of a versioned cart mutation. A rejected update hands back the
/// server's current cart so the client can roll back its optimistic view.
#[derive(Debug, Clone, PartialEq)]
pub enum CartUpdate {
    Applied(Cart),
    Rejected { current: Cart },
}

/// Session-scoped carts. Each session has its own lock, so two customers'
/// carts never contend with each other.
///
/// A session is only retained once something was put in it, and
/// [`CartStore::evict_idle`] drops the ones nobody touched for a while.
pub struct CartStore {
    sessions: DashMap<String, Arc<Mutex<SessionSlot>>>,
    catalog: Arc<dyn MenuCatalog>,
}

impl CartStore {
    pub fn new(catalog: Arc<dyn MenuCatalog>) -> Self {
        Self {
            sessions: DashMap::new(),
            catalog,
        }
    }

    fn session(&self, session_id: &str) -> Arc<Mutex<SessionSlot>> {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Drops the session if it is still empty and no other request holds it.
    /// Slots are only cloned under the shard lock, so a strong count of one
    /// here is stable.
    fn release(&self, session_id: &str, session: Arc<Mutex<SessionSlot>>) {
        drop(session);
        self.sessions.remove_if(session_id, |_, slot| {
            Arc::strong_count(slot) == 1 && slot.lock().ctx.is_pristine()
        });
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drops every session idle for at least `max_idle`. Sessions in use by
    /// a request are kept. Returns how many were dropped.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut evicted = 0;
        self.sessions.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            let keep = slot
                .try_lock()
                .map_or(true, |s| s.touched.elapsed() < max_idle);
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            log::info!("Evicted {} idle cart sessions", evicted);
        }
        evicted
    }

    pub fn add(
        &self,
        session_id: &str,
        menu_item_id: Uuid,
        quantity: i32,
        notes: Option<String>,
        expected_version: u64,
    ) -> Result<CartUpdate, DomainError> {
        let item = self
            .catalog
            .find_menu_item(menu_item_id)?
            .ok_or(DomainError::ItemUnavailable(menu_item_id))?;
        self.mutate(session_id, |cart| {
            cart.add(&item, quantity, notes, expected_version)
        })
    }

    pub fn update_quantity(
        &self,
        session_id: &str,
        menu_item_id: Uuid,
        quantity: i32,
        expected_version: u64,
    ) -> Result<CartUpdate, DomainError> {
        self.mutate(session_id, |cart| {
            cart.update_quantity(menu_item_id, quantity, expected_version)
        })
    }

    pub fn remove(
        &self,
        session_id: &str,
        menu_item_id: Uuid,
        expected_version: u64,
    ) -> Result<CartUpdate, DomainError> {
        self.mutate(session_id, |cart| cart.remove(menu_item_id, expected_version))
    }

    /// Current state of the session. An unknown session reads as an empty
    /// cart and is not created.
    pub fn snapshot(&self, session_id: &str) -> SessionContext {
        let session = self.sessions.get(session_id).map(|s| s.value().clone());
        session
            .map(|slot| slot.lock().ctx.clone())
            .unwrap_or_default()
    }

    /// Runs `f` with exclusive access to the session.
    pub fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut SessionContext) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let session = self.session(session_id);
        let out = {
            let mut slot = session.lock();
            slot.touched = Instant::now();
            f(&mut slot.ctx)
        };
        self.release(session_id, session);
        out
    }

    /// Hands a snapshot of the session to `f` and clears the cart only if
    /// `f` succeeds. The session stays locked throughout, so no cart edit
    /// can slip in between the snapshot and the clear.
    pub fn checkout<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&SessionContext) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        self.with_session(session_id, |ctx| {
            let out = f(ctx)?;
            ctx.cart.clear();
            ctx.applied_promo = None;
            Ok(out)
        })
    }

    fn mutate(
        &self,
        session_id: &str,
        op: impl FnOnce(&mut Cart) -> Result<(), DomainError>,
    ) -> Result<CartUpdate, DomainError> {
        self.with_session(session_id, |ctx| {
            let mut next = ctx.cart.clone();
            match op(&mut next) {
                Ok(()) => {
                    ctx.cart = next;
                    Ok(CartUpdate::Applied(ctx.cart.clone()))
                }
                Err(DomainError::StaleVersion { expected, current }) => {
                    log::info!(
                        "Rejected stale cart update for session {} (expected v{}, current v{})",
                        session_id,
                        expected,
                        current
                    );
                    Ok(CartUpdate::Rejected {
                        current: ctx.cart.clone(),
                    })
                }
                Err(e) => Err(e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::menu::MenuItem;
    use crate::infrastructure::memory::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, CartStore, MenuItem) {
        let store = Arc::new(MemoryStore::default());
        let item = MenuItem {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            name: "Masala Dosa".to_string(),
            price: BigDecimal::from(120),
            is_available: true,
        };
        store.insert_menu_item(item.clone());
        let carts = CartStore::new(store.clone());
        (store, carts, item)
    }

    fn applied(update: CartUpdate) -> Cart {
        match update {
            CartUpdate::Applied(cart) => cart,
            CartUpdate::Rejected { current } => panic!("unexpected rejection at v{}", current.version()),
        }
    }

    #[test]
    fn stale_update_is_rejected_with_current_state() {
        let (_store, carts, item) = setup();
        let mut version = 0;
        for _ in 0..3 {
            version = applied(carts.add("s1", item.id, 1, None, version).expect("add")).version();
        }
        assert_eq!(version, 3);

        // Client B updates from v3 to v4.
        let b = applied(carts.update_quantity("s1", item.id, 7, 3).expect("update"));
        assert_eq!(b.version(), 4);

        // Client A still cites v3.
        let a = carts.update_quantity("s1", item.id, 1, 3).expect("update");
        let CartUpdate::Rejected { current } = a else {
            panic!("stale update should be rejected");
        };
        assert_eq!(current.version(), 4);
        assert_eq!(current.lines()[0].quantity, 7);
        assert_eq!(carts.snapshot("s1").cart, current);
    }

    #[test]
    fn unknown_menu_item_is_unavailable() {
        let (_store, carts, _item) = setup();
        let err = carts.add("s1", Uuid::new_v4(), 1, None, 0).unwrap_err();
        assert!(matches!(err, DomainError::ItemUnavailable(_)));
        assert_eq!(carts.snapshot("s1").cart.version(), 0);
    }

    #[test]
    fn sessions_are_isolated() {
        let (_store, carts, item) = setup();
        applied(carts.add("alice", item.id, 2, None, 0).expect("add"));

        assert!(carts.snapshot("bob").cart.is_empty());
        assert_eq!(carts.snapshot("alice").cart.lines().len(), 1);
    }

    #[test]
    fn checkout_clears_only_on_success() {
        let (_store, carts, item) = setup();
        applied(carts.add("s1", item.id, 1, None, 0).expect("add"));

        let failed: Result<(), DomainError> = carts.checkout("s1", |_| Err(DomainError::CartStale(Uuid::nil())));
        assert!(failed.is_err());
        assert_eq!(carts.snapshot("s1").cart.lines().len(), 1);

        let lines = carts
            .checkout("s1", |ctx| Ok(ctx.cart.lines().len()))
            .expect("checkout");
        assert_eq!(lines, 1);
        let after = carts.snapshot("s1").cart;
        assert!(after.is_empty());
        assert_eq!(after.version(), 2);
    }

    #[test]
    fn concurrent_writers_citing_same_version_only_one_wins() {
        let (_store, carts, item) = setup();
        let carts = Arc::new(carts);
        applied(carts.add("shared", item.id, 1, None, 0).expect("add"));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let carts = carts.clone();
                let id = item.id;
                thread::spawn(move || carts.update_quantity("shared", id, i + 2, 1).expect("update"))
            })
            .collect();
        let results: Vec<CartUpdate> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();

        let wins = results
            .iter()
            .filter(|r| matches!(r, CartUpdate::Applied(_)))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(carts.snapshot("shared").cart.version(), 2);
    }

    #[test]
    fn reads_and_failed_writes_leave_no_session_behind() {
        let (_store, carts, item) = setup();
        for i in 0..100 {
            assert!(carts.snapshot(&format!("reader-{i}")).cart.is_empty());
            let err = carts.remove(&format!("writer-{i}"), item.id, 0).unwrap_err();
            assert!(matches!(err, DomainError::NotFound(_)));
        }
        let stale = carts.update_quantity("late", item.id, 2, 5).expect("update");
        assert!(matches!(stale, CartUpdate::Rejected { .. }));

        assert_eq!(carts.session_count(), 0);
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let (_store, carts, item) = setup();
        applied(carts.add("s1", item.id, 1, None, 0).expect("add"));
        applied(carts.add("s2", item.id, 1, None, 0).expect("add"));

        assert_eq!(carts.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(carts.session_count(), 2);

        assert_eq!(carts.evict_idle(Duration::ZERO), 2);
        assert_eq!(carts.session_count(), 0);
        assert!(carts.snapshot("s1").cart.is_empty());
    }

    #[test]
    fn overflowing_quantity_is_rejected_and_cart_kept() {
        let (_store, carts, item) = setup();
        applied(carts.add("s1", item.id, i32::MAX, None, 0).expect("add"));

        let err = carts.add("s1", item.id, 1, None, 1).unwrap_err();

        assert!(matches!(err, DomainError::InvalidQuantity));
        let cart = carts.snapshot("s1").cart;
        assert_eq!(cart.version(), 1);
        assert_eq!(cart.lines()[0].quantity, i32::MAX);
    }
}
