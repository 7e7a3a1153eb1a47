use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;
use uuid::Uuid;

use common::types::ApiResponse;
use models::product;
use service::errors::ServiceError;
use service::pagination::ADMIN_DEFAULT_LIMIT;
use service::products::{self, ProductInput, ProductPatch};

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, ListQuery};
use crate::routes::{done, listing, ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/admin/products", tag = "admin", params(("search" = Option<String>, Query, description = "Free-text search"), ("make" = Option<String>, Query, description = "Vehicle make"), ("model" = Option<String>, Query, description = "Vehicle model"), ("year" = Option<i32>, Query, description = "Model year"), ("minPrice" = Option<String>, Query, description = "Minimum price"), ("maxPrice" = Option<String>, Query, description = "Maximum price"), ("limit" = Option<i64>, Query, description = "Page size (max 100)"), ("offset" = Option<i64>, Query, description = "Rows to skip")), responses((status = 200, description = "Product page")))]
pub async fn list(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<Value> {
    let page = q.page(ADMIN_DEFAULT_LIMIT)?;
    let found = products::list(&state.db, &q.product_filter()?, page).await?;
    ok("Products retrieved successfully", listing("products", found)?)
}

#[utoipa::path(get, path = "/api/admin/products/search", tag = "admin", params(("q" = String, Query, description = "Search term")), responses((status = 200, description = "Matching products"), (status = 400, description = "Missing q")))]
pub async fn search(State(state): State<ServerState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult<Value> {
    let page = q.page(ADMIN_DEFAULT_LIMIT)?;
    let term = q.q().ok_or_else(|| ServiceError::validation("Search query is required"))?;
    let mut filter = q.product_filter()?;
    filter.search = Some(term.to_string());
    let found = products::list(&state.db, &filter, page).await?;
    ok("Products retrieved successfully", listing("products", found)?)
}

#[utoipa::path(get, path = "/api/admin/products/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Resource id")), responses((status = 200, description = "Product"), (status = 404, description = "Not found")))]
pub async fn get(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<product::Model> {
    ok("Product retrieved successfully", products::get(&state.db, id).await?)
}

#[utoipa::path(post, path = "/api/admin/products", tag = "admin", request_body = crate::openapi::ProductRequest, responses((status = 201, description = "Created"), (status = 400, description = "Invalid"), (status = 409, description = "Duplicate SKU")))]
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<product::Model>>), ApiError> {
    let created = products::create(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Product created successfully", created))))
}

#[utoipa::path(put, path = "/api/admin/products/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Resource id")), request_body = crate::openapi::ProductRequest, responses((status = 200, description = "Updated"), (status = 404, description = "Not found")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> ApiResult<product::Model> {
    ok("Product updated successfully", products::update(&state.db, id, patch).await?)
}

#[utoipa::path(delete, path = "/api/admin/products/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Resource id")), responses((status = 200, description = "Deleted"), (status = 404, description = "Not found")))]
pub async fn delete(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<()> {
    products::delete(&state.db, id).await?;
    done("Product deleted successfully")
}
