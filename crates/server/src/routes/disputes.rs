use axum::{extract::State, http::StatusCode, Extension, Json};
use uuid::Uuid;

use common::types::ApiResponse;
use models::dispute;
use service::disputes::{self, CreateDisputeInput};
use service::views::DisputeView;

use crate::auth::AuthContext;
use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::routes::{ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(post, path = "/api/disputes", tag = "disputes", request_body = crate::openapi::CreateDisputeRequest, responses((status = 201, description = "Dispute filed"), (status = 404, description = "Order not found"), (status = 409, description = "Active dispute exists")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    ApiJson(input): ApiJson<CreateDisputeInput>,
) -> Result<(StatusCode, Json<ApiResponse<dispute::Model>>), ApiError> {
    let created = disputes::create(&state.db, ctx.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Dispute created successfully", created))))
}

#[utoipa::path(get, path = "/api/disputes", tag = "disputes", responses((status = 200, description = "Own disputes")))]
pub async fn list(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>) -> ApiResult<Vec<DisputeView>> {
    ok("Disputes retrieved successfully", disputes::list_own(&state.db, ctx.user_id).await?)
}

#[utoipa::path(get, path = "/api/disputes/{id}", tag = "disputes", params(("id" = Uuid, Path, description = "Resource id")), responses((status = 200, description = "Dispute"), (status = 404, description = "Not found")))]
pub async fn get(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<DisputeView> {
    ok("Dispute retrieved successfully", disputes::get_own(&state.db, ctx.user_id, id).await?)
}
