use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use service::pagination::ADMIN_DEFAULT_LIMIT;
use service::transactions::{self, TransactionAnalytics};
use service::views::TransactionView;

use crate::extract::{ApiPath, ApiQuery, ListQuery};
use crate::routes::{listing, ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/admin/transactions", tag = "admin", params(("status" = Option<String>, Query, description = "Status filter"), ("userId" = Option<Uuid>, Query, description = "Owner user id"), ("orderId" = Option<Uuid>, Query, description = "Order id"), ("startDate" = Option<String>, Query, description = "Created on or after (RFC 3339 or YYYY-MM-DD)"), ("endDate" = Option<String>, Query, description = "Created on or before (inclusive)"), ("limit" = Option<i64>, Query, description = "Page size (max 100)"), ("offset" = Option<i64>, Query, description = "Rows to skip")), responses((status = 200, description = "Payment intents")))]
pub async fn list(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<Value> {
    let page = q.page(ADMIN_DEFAULT_LIMIT)?;
    let found = transactions::list(&state.db, &q.transaction_filter()?, page).await?;
    ok("Transactions retrieved successfully", listing("transactions", found)?)
}

#[utoipa::path(get, path = "/api/admin/transactions/search", tag = "admin", params(("q" = String, Query, description = "Reference or payer name/email")), responses((status = 200, description = "Matching transactions"), (status = 400, description = "Missing q")))]
pub async fn search(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<Value> {
    let page = q.page(ADMIN_DEFAULT_LIMIT)?;
    let found = transactions::search(&state.db, q.q(), &q.transaction_filter()?, page).await?;
    ok("Transactions retrieved successfully", listing("transactions", found)?)
}

#[utoipa::path(get, path = "/api/admin/transactions/analytics", tag = "admin", params(("startDate" = Option<String>, Query, description = "Created on or after (RFC 3339 or YYYY-MM-DD)"), ("endDate" = Option<String>, Query, description = "Created on or before (inclusive)")), responses((status = 200, description = "Transaction analytics")))]
pub async fn analytics(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<TransactionAnalytics> {
    ok("Transaction analytics retrieved successfully", transactions::analytics(&state.db, q.range()?, None).await?)
}

#[utoipa::path(get, path = "/api/admin/transactions/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Resource id")), responses((status = 200, description = "Transaction with user and order"), (status = 404, description = "Not found")))]
pub async fn detail(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<TransactionView> {
    ok("Transaction retrieved successfully", transactions::detail(&state.db, id).await?)
}
