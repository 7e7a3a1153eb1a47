use axum::extract::State;

use service::analytics::{self, Dashboard};
use service::transactions::TransactionAnalytics;

use crate::extract::{ApiQuery, ListQuery};
use crate::routes::{ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/admin/analytics/dashboard", tag = "admin", responses((status = 200, description = "Dashboard totals, recent activity and monthly series")))]
pub async fn dashboard(State(state): State<ServerState>) -> ApiResult<Dashboard> {
    ok("Dashboard analytics retrieved successfully", analytics::dashboard(&state.db).await?)
}

#[utoipa::path(get, path = "/api/admin/analytics/transactions", tag = "admin", params(("startDate" = Option<String>, Query, description = "Created on or after (RFC 3339 or YYYY-MM-DD)"), ("endDate" = Option<String>, Query, description = "Created on or before (inclusive)")), responses((status = 200, description = "Transaction rollup with the ten latest intents")))]
pub async fn transactions(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<TransactionAnalytics> {
    ok("Transaction analytics retrieved successfully", analytics::transaction_analytics(&state.db, q.range()?).await?)
}
