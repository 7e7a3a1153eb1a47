use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use service::orders::{self, OrderAnalytics, UpdateStatusInput};
use service::pagination::ADMIN_DEFAULT_LIMIT;
use service::views::OrderView;

use crate::extract::{ApiJson, ApiPath, ApiQuery, ListQuery};
use crate::routes::{listing, ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/admin/orders", tag = "admin", params(("status" = Option<String>, Query, description = "Status filter"), ("userId" = Option<Uuid>, Query, description = "Owner user id"), ("startDate" = Option<String>, Query, description = "Created on or after (RFC 3339 or YYYY-MM-DD)"), ("endDate" = Option<String>, Query, description = "Created on or before (inclusive)"), ("limit" = Option<i64>, Query, description = "Page size (max 100)"), ("offset" = Option<i64>, Query, description = "Rows to skip")), responses((status = 200, description = "Orders with user, items, intents and disputes")))]
pub async fn list(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<Value> {
    let page = q.page(ADMIN_DEFAULT_LIMIT)?;
    let found = orders::admin_list(&state.db, &q.order_filter()?, page).await?;
    ok("Orders retrieved successfully", listing("orders", found)?)
}

#[utoipa::path(get, path = "/api/admin/orders/search", tag = "admin", params(("q" = String, Query, description = "Order id fragment or customer name/email")), responses((status = 200, description = "Matching orders"), (status = 400, description = "Missing q")))]
pub async fn search(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<Value> {
    let page = q.page(ADMIN_DEFAULT_LIMIT)?;
    let found = orders::admin_search(&state.db, q.q(), &q.order_filter()?, page).await?;
    ok("Orders retrieved successfully", listing("orders", found)?)
}

#[utoipa::path(get, path = "/api/admin/orders/analytics", tag = "admin", params(("startDate" = Option<String>, Query, description = "Created on or after (RFC 3339 or YYYY-MM-DD)"), ("endDate" = Option<String>, Query, description = "Created on or before (inclusive)")), responses((status = 200, description = "Order analytics")))]
pub async fn analytics(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<OrderAnalytics> {
    ok("Order analytics retrieved successfully", orders::analytics(&state.db, q.range()?).await?)
}

#[utoipa::path(get, path = "/api/admin/orders/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Resource id")), responses((status = 200, description = "Order with history, intents and disputes"), (status = 404, description = "Not found")))]
pub async fn detail(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<OrderView> {
    ok("Order retrieved successfully", orders::detail(&state.db, id).await?)
}

#[utoipa::path(put, path = "/api/admin/orders/{id}/status", tag = "admin", params(("id" = Uuid, Path, description = "Resource id")), request_body = crate::openapi::UpdateOrderStatusRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Unknown status"), (status = 404, description = "Not found")))]
pub async fn update_status(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateStatusInput>,
) -> ApiResult<OrderView> {
    ok("Order status updated successfully", orders::update_status(&state.db, id, input).await?)
}
