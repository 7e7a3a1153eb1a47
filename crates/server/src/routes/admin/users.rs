use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::Value;
use uuid::Uuid;

use common::types::ApiResponse;
use service::pagination::ADMIN_DEFAULT_LIMIT;
use service::users::{self, AdminCreateUser, AdminUpdateUser, AdminUserDetail, UserAnalytics};
use service::views::PublicUser;

use crate::auth::AuthContext;
use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, ListQuery};
use crate::routes::{done, listing, ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/admin/users", tag = "admin", params(("search" = Option<String>, Query, description = "Free-text search"), ("role" = Option<String>, Query, description = "Role filter"), ("startDate" = Option<String>, Query, description = "Created on or after (RFC 3339 or YYYY-MM-DD)"), ("endDate" = Option<String>, Query, description = "Created on or before (inclusive)"), ("limit" = Option<i64>, Query, description = "Page size (max 100)"), ("offset" = Option<i64>, Query, description = "Rows to skip")), responses((status = 200, description = "Users with order/dispute counts")))]
pub async fn list(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<Value> {
    let page = q.page(ADMIN_DEFAULT_LIMIT)?;
    let found = users::admin_list(&state.db, &q.user_filter()?, page).await?;
    ok("Users retrieved successfully", listing("users", found)?)
}

#[utoipa::path(get, path = "/api/admin/users/search", tag = "admin", params(("q" = String, Query, description = "Search term")), responses((status = 200, description = "Matching users"), (status = 400, description = "Missing q")))]
pub async fn search(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<Value> {
    let page = q.page(ADMIN_DEFAULT_LIMIT)?;
    let found = users::admin_search(&state.db, q.q(), &q.user_filter()?, page).await?;
    ok("Users retrieved successfully", listing("users", found)?)
}

#[utoipa::path(get, path = "/api/admin/users/analytics", tag = "admin", responses((status = 200, description = "User analytics")))]
pub async fn analytics(State(state): State<ServerState>) -> ApiResult<UserAnalytics> {
    ok("User analytics retrieved successfully", users::analytics(&state.db).await?)
}

#[utoipa::path(post, path = "/api/admin/users", tag = "admin", request_body = crate::openapi::AdminCreateUserRequest, responses((status = 201, description = "Created"), (status = 409, description = "Email taken")))]
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<AdminCreateUser>,
) -> Result<(StatusCode, Json<ApiResponse<PublicUser>>), ApiError> {
    let created = users::admin_create(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("User created successfully", created))))
}

#[utoipa::path(get, path = "/api/admin/users/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Resource id")), responses((status = 200, description = "User with recent orders and disputes"), (status = 404, description = "Not found")))]
pub async fn detail(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<AdminUserDetail> {
    ok("User retrieved successfully", users::admin_detail(&state.db, id).await?)
}

#[utoipa::path(put, path = "/api/admin/users/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Resource id")), request_body = crate::openapi::AdminUpdateUserRequest, responses((status = 200, description = "Updated"), (status = 404, description = "Not found")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<AdminUpdateUser>,
) -> ApiResult<PublicUser> {
    ok("User updated successfully", users::admin_update(&state.db, id, input).await?)
}

#[utoipa::path(delete, path = "/api/admin/users/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Resource id")), responses((status = 200, description = "Deleted"), (status = 400, description = "Cannot delete self"), (status = 404, description = "Not found")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    users::admin_delete(&state.db, ctx.user_id, id).await?;
    done("User deleted successfully")
}
