use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use food_order_service::config::AppConfig;
use food_order_service::infrastructure::delivery_fee::FlatDeliveryFee;
use food_order_service::infrastructure::Repositories;
use food_order_service::{build_server, create_pool, run_migrations, AppState, StartupError};

#[actix_web::main]
async fn main() -> Result<(), StartupError> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.db_pool_size)?;
    run_migrations(&pool)?;

    let fees = Arc::new(FlatDeliveryFee::new(config.delivery_charge.clone()));
    let state = AppState::new(
        Repositories::postgres(pool, fees),
        config.table_poll_interval,
    );

    let carts = state.carts.clone();
    let ttl = config.cart_idle_ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval((ttl / 4).max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            carts.evict_idle(ttl);
        }
    });

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await?;
    Ok(())
}
