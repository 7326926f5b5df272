pub mod cart;
pub mod errors;
pub mod menu;
pub mod money;
pub mod order;
pub mod ports;
pub mod promo;
pub mod state_machine;
pub mod table;
