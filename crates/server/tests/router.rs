//! Router tests that never reach the database: auth guards, extractor
//! rejections, webhook pre-checks and uploads against in-memory doubles.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use configs::AppConfig;
use server::routes;
use server::state::{Integrations, ServerState};
use service::auth::domain::AuthUser;
use service::auth::token;
use service::checkout::gateway::mock::StubGateway;
use service::email::mock::RecordingMailer;
use service::uploads::mock::MemoryStore;

const SECRET: &str = "router-test-secret";

fn config(webhook_secret: &str) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = SECRET.into();
    cfg.paystack.webhook_secret = webhook_secret.into();
    cfg
}

fn app_with(cfg: &AppConfig) -> Router {
    let state = ServerState::new(
        DatabaseConnection::Disconnected,
        cfg,
        Integrations {
            mailer: Arc::new(RecordingMailer::default()),
            gateway: Arc::new(StubGateway::default()),
            images: Arc::new(MemoryStore),
        },
    );
    routes::build_router(state, tower_http::cors::CorsLayer::very_permissive())
}

fn app() -> Router {
    app_with(&config(""))
}

fn bearer(roles: &[&str]) -> String {
    let user = AuthUser {
        id: Uuid::new_v4(),
        email: "tester@example.com".into(),
        full_name: "Tester".into(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    };
    token::issue(SECRET, &user, chrono::Duration::hours(1)).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn banner_and_health() {
    let (s, v) = send(app(), get("/api", None)).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(v["message"], json!("Auto Shop API is running!"));

    let (s, v) = send(app(), get("/api/health", None)).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(v["status"], json!("healthy"));
    assert!(v["uptime_secs"].is_u64());
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let (s, v) = send(app(), get("/api/openapi.json", None)).await;
    assert_eq!(s, StatusCode::OK);
    assert!(v["paths"]["/api/products"].is_object());
    assert!(v["paths"]["/api/admin/analytics/dashboard"].is_object());
}

#[tokio::test]
async fn protected_routes_require_token() {
    let (s, v) = send(app(), get("/api/cart", None)).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
    assert_eq!(v["success"], json!(false));

    let req = Request::builder()
        .uri("/api/cart")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(app(), req).await.0, StatusCode::UNAUTHORIZED);

    let (s, _) = send(app(), get("/api/cart", Some("not.a.jwt"))).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_subtree_is_role_gated() {
    let customer = bearer(&["CUSTOMER"]);
    let (s, v) = send(app(), get("/api/admin/users", Some(&customer))).await;
    assert_eq!(s, StatusCode::FORBIDDEN);
    assert_eq!(v["message"], json!("Admin access required"));

    let (s, _) = send(app(), get("/api/admin/analytics/dashboard", None)).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_query_values_are_rejected_before_the_database() {
    let admin = bearer(&["ADMIN"]);
    let (s, v) = send(app(), get("/api/admin/users?limit=abc", Some(&admin))).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(v["success"], json!(false));

    let (s, _) = send(app(), get("/api/admin/orders?offset=-5", Some(&admin))).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    let (s, _) = send(app(), get("/api/admin/disputes?status=CLOSED", Some(&admin))).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    let (s, _) = send(app(), get("/api/admin/transactions/search", Some(&admin))).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    let (s, _) = send(app(), get("/api/products?minPrice=cheap", None)).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    let (s, v) = send(app(), get("/api/products/not-a-uuid", None)).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], json!("Invalid path parameter"));
}

#[tokio::test]
async fn malformed_json_gets_envelope() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\":"))
        .unwrap();
    let (s, v) = send(app(), req).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], json!("Invalid request body"));
    assert!(v["error"].is_string());
}

async fn logout_cookie(cookie: Option<&str>) -> String {
    let mut b = Request::builder().method("POST").uri("/api/auth/logout");
    if let Some(c) = cookie {
        b = b.header(header::COOKIE, c);
    }
    let resp = app().oneshot(b.body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string()
}

#[tokio::test]
async fn logout_clears_cookie() {
    for sent in [None, Some("auth_token=abc")] {
        let cookie = logout_cookie(sent).await;
        assert!(cookie.starts_with("auth_token=;"), "{cookie}");
        assert!(cookie.contains("Max-Age=0"), "{cookie}");
        assert!(cookie.contains("Path=/"), "{cookie}");
    }
}

fn webhook(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut b = Request::builder()
        .method("POST")
        .uri("/api/checkout/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(sig) = signature {
        b = b.header("x-paystack-signature", sig);
    }
    b.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn webhook_signature_and_event_filter() {
    let body = r#"{"event":"transfer.success","data":{"reference":"AS-x"}}"#;

    let signed = app_with(&config("whsec_test"));
    let (s, _) = send(signed.clone(), webhook(body, None)).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);
    let (s, _) = send(signed.clone(), webhook(body, Some("deadbeef"))).await;
    assert_eq!(s, StatusCode::UNAUTHORIZED);

    let sig = service::checkout::webhook::sign("whsec_test", body.as_bytes());
    let (s, v) = send(signed, webhook(body, Some(&sig))).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(v["data"]["status"], json!("ignored"));

    // 未配置密钥时不校验签名
    let (s, v) = send(app(), webhook(body, None)).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(v["data"]["status"], json!("ignored"));

    let (s, _) = send(app(), webhook("not json", None)).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
}

fn multipart(parts: &[(&str, Option<&str>, &str)]) -> (String, Vec<u8>) {
    let boundary = "XBOUNDARYX";
    let mut body = Vec::new();
    for (name, file, content) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match file {
            Some(f) => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: image/png\r\n\r\n").as_bytes(),
            ),
            None => body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes()),
        }
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

fn upload(auth: (&str, String), parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    let (ct, body) = multipart(parts);
    Request::builder()
        .method("POST")
        .uri("/api/uploads/image")
        .header(header::CONTENT_TYPE, ct)
        .header(auth.0, auth.1)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn image_upload_requires_file_part() {
    let t = bearer(&["CUSTOMER"]);
    let (s, v) = send(app(), upload(("authorization", format!("Bearer {t}")), &[("caption", None, "front bumper")])).await;
    assert_eq!(s, StatusCode::BAD_REQUEST);
    assert_eq!(v["message"], json!("File is required"));
}

#[tokio::test]
async fn image_upload_accepts_cookie_session() {
    let t = bearer(&["CUSTOMER"]);
    let req = upload(("cookie", format!("theme=dark; auth_token={t}")), &[("file", Some("bumper.png"), "PNGDATA")]);
    let (s, v) = send(app(), req).await;
    assert_eq!(s, StatusCode::OK);
    assert_eq!(v["data"]["url"], json!("https://images.test/bumper.png"));
    assert_eq!(v["data"]["public_id"], json!("test/bumper.png"));
}
