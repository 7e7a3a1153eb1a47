use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use models::product;
use service::pagination::PUBLIC_DEFAULT_LIMIT;
use service::products;

use crate::extract::{ApiPath, ApiQuery, ListQuery};
use crate::routes::{listing, ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    params(
        ("search" = Option<String>, Query, description = "Matches title, description, make or model"),
        ("make" = Option<String>, Query, description = "Vehicle make"), ("model" = Option<String>, Query, description = "Vehicle model"), ("year" = Option<i32>, Query, description = "Model year"),
        ("minPrice" = Option<String>, Query, description = "Minimum price"), ("maxPrice" = Option<String>, Query, description = "Maximum price"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)"), ("offset" = Option<i64>, Query, description = "Rows to skip")
    ),
    responses((status = 200, description = "Product page"), (status = 400, description = "Bad filter"))
)]
pub async fn list(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<Value> {
    let page = q.page(PUBLIC_DEFAULT_LIMIT)?;
    let filter = q.product_filter()?;
    let found = products::list(&state.db, &filter, page).await?;
    ok("Products retrieved successfully", listing("products", found)?)
}

#[utoipa::path(get, path = "/api/products/{id}", tag = "products", params(("id" = Uuid, Path, description = "Resource id")), responses((status = 200, description = "Product"), (status = 404, description = "Not found")))]
pub async fn get(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<product::Model> {
    ok("Product retrieved successfully", products::get(&state.db, id).await?)
}
