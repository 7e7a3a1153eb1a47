//! Role-gated `/api/admin` subtree.

use axum::{
    routing::{get, put},
    Router,
};

use crate::state::ServerState;

pub mod analytics;
pub mod disputes;
pub mod orders;
pub mod products;
pub mod transactions;
pub mod users;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/search", get(users::search))
        .route("/users/analytics", get(users::analytics))
        .route("/users/:id", get(users::detail).put(users::update).delete(users::delete))
        .route("/products", get(products::list).post(products::create))
        .route("/products/search", get(products::search))
        .route("/products/:id", get(products::get).put(products::update).delete(products::delete))
        .route("/orders", get(orders::list))
        .route("/orders/search", get(orders::search))
        .route("/orders/analytics", get(orders::analytics))
        .route("/orders/:id", get(orders::detail))
        .route("/orders/:id/status", put(orders::update_status))
        .route("/disputes", get(disputes::list))
        .route("/disputes/search", get(disputes::search))
        .route("/disputes/analytics", get(disputes::analytics))
        .route("/disputes/:id", get(disputes::detail).put(disputes::update))
        .route("/transactions", get(transactions::list))
        .route("/transactions/search", get(transactions::search))
        .route("/transactions/analytics", get(transactions::analytics))
        .route("/transactions/:id", get(transactions::detail))
        .route("/analytics/dashboard", get(analytics::dashboard))
        .route("/analytics/transactions", get(analytics::transactions))
}
