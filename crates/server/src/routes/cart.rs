use axum::{extract::State, Extension};
use uuid::Uuid;

use service::cart::{self, AddItemInput, CartView, UpdateQuantityInput};

use crate::auth::AuthContext;
use crate::extract::{ApiJson, ApiPath};
use crate::routes::{done, ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/cart", tag = "cart", responses((status = 200, description = "Cart with subtotal")))]
pub async fn get(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>) -> ApiResult<CartView> {
    ok("Cart retrieved successfully", cart::get(&state.db, ctx.user_id).await?)
}

#[utoipa::path(post, path = "/api/cart/items", tag = "cart", request_body = crate::openapi::AddCartItemRequest, responses((status = 200, description = "Updated cart"), (status = 404, description = "Unknown product")))]
pub async fn add_item(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    ApiJson(input): ApiJson<AddItemInput>,
) -> ApiResult<CartView> {
    ok("Item added to cart", cart::add_item(&state.db, ctx.user_id, input).await?)
}

#[utoipa::path(patch, path = "/api/cart/items/{id}", tag = "cart", params(("id" = Uuid, Path, description = "Resource id")), request_body = crate::openapi::UpdateQuantityRequest, responses((status = 200, description = "Updated cart"), (status = 404, description = "Not in caller's cart")))]
pub async fn update_item(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateQuantityInput>,
) -> ApiResult<CartView> {
    ok("Cart item updated", cart::update_item(&state.db, ctx.user_id, id, input.quantity).await?)
}

#[utoipa::path(delete, path = "/api/cart/items/{id}", tag = "cart", params(("id" = Uuid, Path, description = "Resource id")), responses((status = 200, description = "Updated cart"), (status = 404, description = "Not in caller's cart")))]
pub async fn remove_item(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<CartView> {
    ok("Item removed from cart", cart::remove_item(&state.db, ctx.user_id, id).await?)
}

#[utoipa::path(delete, path = "/api/cart", tag = "cart", responses((status = 200, description = "Cart emptied")))]
pub async fn clear(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>) -> ApiResult<()> {
    cart::clear(&state.db, ctx.user_id).await?;
    done("Cart cleared successfully")
}
