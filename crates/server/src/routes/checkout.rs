use axum::{body::Bytes, extract::State, http::HeaderMap, Extension};
use serde_json::{json, Value};
use tracing::info;

use service::checkout::webhook::SIGNATURE_HEADER;
use service::checkout::CheckoutSession;

use crate::auth::AuthContext;
use crate::routes::{ok, ApiResult};
use crate::state::ServerState;

#[utoipa::path(post, path = "/api/checkout/initiate", tag = "checkout", responses((status = 200, description = "Hosted checkout session"), (status = 400, description = "Cart is empty"), (status = 502, description = "Gateway failure")))]
pub async fn initiate(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>) -> ApiResult<CheckoutSession> {
    ok("Payment initiated successfully", state.checkout.initiate(ctx.user_id).await?)
}

/// Gateway callback. The raw body is kept intact for signature verification.
#[utoipa::path(post, path = "/api/checkout/webhook", tag = "checkout", responses((status = 200, description = "Processed, ignored or already applied"), (status = 401, description = "Bad signature")))]
pub async fn webhook(State(state): State<ServerState>, headers: HeaderMap, body: Bytes) -> ApiResult<Value> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let outcome = state.checkout.handle_webhook(&body, signature).await?;
    info!(status = outcome.message(), order_id = ?outcome.order_id(), "webhook_handled");
    ok("Webhook processed", json!({ "status": outcome.message(), "orderId": outcome.order_id() }))
}
