//! SeaORM entities for the shop schema plus small validation and write helpers.
//!
//! Helpers are generic over `ConnectionTrait` so they run inside transactions.

pub mod errors;
pub mod db;
pub mod status;
pub mod user;
pub mod user_credentials;
pub mod password_reset_token;
pub mod product;
pub mod cart;
pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod order_history;
pub mod payment_intent;
pub mod dispute;

#[cfg(test)]
mod tests;
