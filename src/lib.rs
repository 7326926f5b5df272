pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod state;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};
pub use state::AppState;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::cart::get_cart,
        handlers::cart::add_item,
        handlers::cart::update_item,
        handlers::cart::remove_item,
        handlers::promo::apply_promo,
        handlers::promo::remove_promo,
        handlers::orders::checkout,
        handlers::orders::create_table_order,
        handlers::orders::transition_status,
        handlers::orders::add_items,
        handlers::orders::get_order,
        handlers::orders::list_restaurant_orders,
        handlers::tables::restaurant_tables_status,
        handlers::tables::table_status,
    ),
    tags(
        (name = "cart", description = "Session carts"),
        (name = "promo", description = "Promo codes on the cart"),
        (name = "orders", description = "Order placement and lifecycle"),
        (name = "tables", description = "Table occupancy"),
    )
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), StartupError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| StartupError::Migration(e.to_string()))?;
    Ok(())
}

/// Registers every API route. Expects `web::Data<AppState>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cart")
            .route("", web::get().to(handlers::cart::get_cart))
            .route("/items", web::post().to(handlers::cart::add_item))
            .route("/update", web::post().to(handlers::cart::update_item))
            .route("/remove", web::post().to(handlers::cart::remove_item))
            .route("/promo/apply", web::post().to(handlers::promo::apply_promo))
            .route("/promo/remove", web::post().to(handlers::promo::remove_promo)),
    )
    .service(
        web::scope("/orders")
            .route("/checkout", web::post().to(handlers::orders::checkout))
            .route("/table", web::post().to(handlers::orders::create_table_order))
            .route("/status", web::post().to(handlers::orders::transition_status))
            .route("/{id}/items", web::post().to(handlers::orders::add_items))
            .route("/{id}", web::get().to(handlers::orders::get_order)),
    )
    .route(
        "/restaurants/{id}/orders",
        web::get().to(handlers::orders::list_restaurant_orders),
    )
    .service(
        web::scope("/tables")
            .route(
                "/status",
                web::get().to(handlers::tables::restaurant_tables_status),
            )
            .route("/{id}/status", web::get().to(handlers::tables::table_status)),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
