use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::ApiResponse;
use service::pagination::Paged;

use crate::auth::{require_admin, require_auth};
use crate::errors::ApiError;
use crate::openapi::ApiDoc;
use crate::state::ServerState;

pub mod admin;
pub mod app;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod disputes;
pub mod orders;
pub mod products;
pub mod uploads;
pub mod users;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(message, data)))
}

pub fn done(message: impl Into<String>) -> ApiResult<()> {
    Ok(Json(ApiResponse::message(message)))
}

/// `{ <plural>: [...], pagination: {...} }`
pub fn listing<T: Serialize>(key: &str, page: Paged<T>) -> Result<Value, ApiError> {
    let mut body = Map::new();
    body.insert(key.to_string(), serde_json::to_value(page.items)?);
    body.insert("pagination".to_string(), serde_json::to_value(page.pagination)?);
    Ok(Value::Object(body))
}

fn public_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(app::root))
        .route("/health", get(app::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/products", get(products::list))
        .route("/products/:id", get(products::get))
        // 支付回调：签名校验在 service 层完成，不走 Bearer 认证
        .route("/checkout/webhook", post(checkout::webhook))
}

fn protected_routes(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/me/orders", get(users::my_orders))
        .route("/cart", get(cart::get).delete(cart::clear))
        .route("/cart/items", post(cart::add_item))
        .route("/cart/items/:id", patch(cart::update_item).delete(cart::remove_item))
        .route("/checkout/initiate", post(checkout::initiate))
        .route("/orders", get(orders::list))
        .route("/disputes", get(disputes::list).post(disputes::create))
        .route("/disputes/:id", get(disputes::get))
        .route(
            "/uploads/image",
            post(uploads::image).layer(DefaultBodyLimit::max(state.max_upload_bytes + 64 * 1024)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

fn admin_routes(state: &ServerState) -> Router<ServerState> {
    admin::router()
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Build the full application router: `/api` tree, Swagger UI, CORS and request tracing.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let api = public_routes()
        .merge(protected_routes(&state))
        .nest("/admin", admin_routes(&state));

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
