use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use service::disputes::{self, AdminUpdateDispute, DisputeAnalytics};
use service::pagination::ADMIN_DEFAULT_LIMIT;
use service::views::DisputeView;

use crate::extract::{ApiJson, ApiPath, ApiQuery, ListQuery};
use crate::routes::{listing, ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/admin/disputes", tag = "admin", params(("status" = Option<String>, Query, description = "Status filter"), ("userId" = Option<Uuid>, Query, description = "Owner user id"), ("orderId" = Option<Uuid>, Query, description = "Order id"), ("startDate" = Option<String>, Query, description = "Created on or after (RFC 3339 or YYYY-MM-DD)"), ("endDate" = Option<String>, Query, description = "Created on or before (inclusive)"), ("limit" = Option<i64>, Query, description = "Page size (max 100)"), ("offset" = Option<i64>, Query, description = "Rows to skip")), responses((status = 200, description = "Disputes")))]
pub async fn list(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<Value> {
    let page = q.page(ADMIN_DEFAULT_LIMIT)?;
    let found = disputes::admin_list(&state.db, &q.dispute_filter()?, page).await?;
    ok("Disputes retrieved successfully", listing("disputes", found)?)
}

#[utoipa::path(get, path = "/api/admin/disputes/search", tag = "admin", params(("q" = String, Query, description = "Search term")), responses((status = 200, description = "Matching disputes"), (status = 400, description = "Missing q")))]
pub async fn search(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<Value> {
    let page = q.page(ADMIN_DEFAULT_LIMIT)?;
    let found = disputes::admin_search(&state.db, q.q(), &q.dispute_filter()?, page).await?;
    ok("Disputes retrieved successfully", listing("disputes", found)?)
}

#[utoipa::path(get, path = "/api/admin/disputes/analytics", tag = "admin", params(("startDate" = Option<String>, Query, description = "Created on or after (RFC 3339 or YYYY-MM-DD)"), ("endDate" = Option<String>, Query, description = "Created on or before (inclusive)")), responses((status = 200, description = "Dispute analytics")))]
pub async fn analytics(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<DisputeAnalytics> {
    ok("Dispute analytics retrieved successfully", disputes::analytics(&state.db, q.range()?).await?)
}

#[utoipa::path(get, path = "/api/admin/disputes/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Resource id")), responses((status = 200, description = "Dispute with order detail"), (status = 404, description = "Not found")))]
pub async fn detail(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<DisputeView> {
    ok("Dispute retrieved successfully", disputes::detail(&state.db, id).await?)
}

#[utoipa::path(put, path = "/api/admin/disputes/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Resource id")), request_body = crate::openapi::AdminUpdateDisputeRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Unknown status"), (status = 404, description = "Not found")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<AdminUpdateDispute>,
) -> ApiResult<DisputeView> {
    ok("Dispute updated successfully", disputes::admin_update(&state.db, id, input).await?)
}
