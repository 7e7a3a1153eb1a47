use axum::{extract::State, Extension};

use service::users::{self, UpdateMeInput};
use service::views::{OrderView, PublicUser};

use crate::auth::AuthContext;
use crate::extract::ApiJson;
use crate::routes::{ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/users/me", tag = "users", responses((status = 200, description = "Profile")))]
pub async fn me(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>) -> ApiResult<PublicUser> {
    ok("Profile retrieved successfully", users::me(&state.db, ctx.user_id).await?)
}

#[utoipa::path(put, path = "/api/users/me", tag = "users", request_body = crate::openapi::UpdateMeRequest, responses((status = 200, description = "Profile updated"), (status = 409, description = "Email taken")))]
pub async fn update_me(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    ApiJson(input): ApiJson<UpdateMeInput>,
) -> ApiResult<PublicUser> {
    ok("Profile updated successfully", users::update_me(&state.db, ctx.user_id, input).await?)
}

#[utoipa::path(get, path = "/api/users/me/orders", tag = "users", responses((status = 200, description = "Own orders, newest first")))]
pub async fn my_orders(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>) -> ApiResult<Vec<OrderView>> {
    ok("Orders retrieved successfully", users::my_orders(&state.db, ctx.user_id).await?)
}
