pub mod cart_store;
pub mod order_factory;
pub mod order_service;
pub mod promo_engine;
pub mod table_occupancy;
