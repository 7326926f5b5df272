use std::sync::Arc;
use std::time::Duration;

use crate::application::cart_store::CartStore;
use crate::application::order_factory::OrderFactory;
use crate::application::order_service::OrderService;
use crate::application::promo_engine::PromoCodeEngine;
use crate::application::table_occupancy::TableOccupancyView;
use crate::infrastructure::Repositories;

/// Application services shared by every HTTP worker.
#[derive(Clone)]
pub struct AppState {
    pub carts: Arc<CartStore>,
    pub promos: Arc<PromoCodeEngine>,
    pub factory: Arc<OrderFactory>,
    pub orders: Arc<OrderService>,
    pub tables: Arc<TableOccupancyView>,
}

impl AppState {
    pub fn new(repos: Repositories, table_poll_interval: Duration) -> Self {
        let carts = Arc::new(CartStore::new(repos.catalog.clone()));
        let promos = Arc::new(PromoCodeEngine::new(
            repos.promos.clone(),
            repos.orders.clone(),
            repos.fees.clone(),
            carts.clone(),
        ));
        let factory = Arc::new(OrderFactory::new(
            repos.catalog.clone(),
            repos.tables.clone(),
            repos.orders.clone(),
            repos.fees.clone(),
            promos.clone(),
            carts.clone(),
        ));
        let orders = Arc::new(OrderService::new(
            repos.orders.clone(),
            repos.catalog.clone(),
        ));
        let tables = Arc::new(TableOccupancyView::new(
            repos.tables,
            repos.orders,
            table_poll_interval,
        ));

        Self {
            carts,
            promos,
            factory,
            orders,
            tables,
        }
    }
}
