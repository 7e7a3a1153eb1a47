use axum::{extract::State, Extension};

use service::orders;
use service::views::OrderView;

use crate::auth::AuthContext;
use crate::routes::{ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/orders", tag = "orders", responses((status = 200, description = "Own orders with items, newest first")))]
pub async fn list(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>) -> ApiResult<Vec<OrderView>> {
    ok("Orders retrieved successfully", orders::list_for_user(&state.db, ctx.user_id).await?)
}
