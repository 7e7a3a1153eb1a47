use std::net::SocketAddr;
use std::sync::Arc;

use migration::MigratorTrait;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use configs::AppConfig;
use server::routes;
use server::state::{Integrations, ServerState};
use service::checkout::gateway::mock::StubGateway;
use service::checkout::webhook;
use service::email::mock::RecordingMailer;
use service::uploads::mock::MemoryStore;

const WEBHOOK_SECRET: &str = "whsec_test";

struct TestApp {
    base_url: String,
    state: ServerState,
    client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn call(&self, req: reqwest::RequestBuilder) -> anyhow::Result<(HttpStatusCode, Value)> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    async fn login(&self, email: &str, password: &str) -> anyhow::Result<String> {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        assert_eq!(resp.status(), HttpStatusCode::OK);
        let cookie = resp
            .headers()
            .get(reqwest::header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cookie.contains("auth_token=") && cookie.contains("HttpOnly"));
        let body: Value = resp.json().await?;
        Ok(body["data"]["access_token"].as_str().unwrap_or_default().to_string())
    }
}

fn skip() -> bool {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        eprintln!("SKIP_DB_TESTS set; skipping e2e");
        return true;
    }
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL missing; skip e2e tests. Provide .env.test or env var.");
        return true;
    }
    false
}

async fn start_server() -> anyhow::Result<TestApp> {
    let db = models::db::connect().await?;
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("migrations notice: {}", e);
    }

    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "test-secret".into();
    cfg.paystack.webhook_secret = WEBHOOK_SECRET.into();
    let state = ServerState::new(
        db,
        &cfg,
        Integrations {
            mailer: Arc::new(RecordingMailer::default()),
            gateway: Arc::new(StubGateway::default()),
            images: Arc::new(MemoryStore),
        },
    );

    let app = routes::build_router(state.clone(), CorsLayer::very_permissive());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url, state, client: reqwest::Client::new() })
}

async fn deliver(app: &TestApp, reference: &str, amount: i64) -> anyhow::Result<(HttpStatusCode, Value)> {
    let body = json!({
        "event": "charge.success",
        "data": { "reference": reference, "amount": amount, "currency": "NGN" }
    })
    .to_string();
    let sig = webhook::sign(WEBHOOK_SECRET, body.as_bytes());
    app.call(
        app.client
            .post(app.url("/api/checkout/webhook"))
            .header("content-type", "application/json")
            .header(webhook::SIGNATURE_HEADER, sig)
            .body(body),
    )
    .await
}

#[tokio::test]
async fn checkout_to_dispute_flow() -> anyhow::Result<()> {
    if skip() {
        return Ok(());
    }
    let app = start_server().await?;
    let tag = Uuid::new_v4().simple().to_string();

    // 注册并登录普通用户
    let email = format!("buyer_{tag}@example.com");
    let (s, v) = app
        .call(app.client.post(app.url("/api/auth/register")).json(&json!({
            "email": email, "password": "Passw0rd!", "fullName": "Buyer One"
        })))
        .await?;
    assert_eq!(s, HttpStatusCode::CREATED, "{v}");
    let (s, _) = app
        .call(app.client.post(app.url("/api/auth/register")).json(&json!({
            "email": email, "password": "Passw0rd!", "fullName": "Buyer Again"
        })))
        .await?;
    assert_eq!(s, HttpStatusCode::CONFLICT);
    let buyer = app.login(&email, "Passw0rd!").await?;

    // 管理员账号直接通过服务创建
    let admin_email = format!("admin_{tag}@example.com");
    app.state
        .auth
        .create_with_password(&admin_email, "Shop Admin", "Adm1nPass!", &["ADMIN".to_string()])
        .await?;
    let admin = app.login(&admin_email, "Adm1nPass!").await?;

    let (s, _) = app
        .call(app.client.get(app.url("/api/admin/products")).bearer_auth(&buyer))
        .await?;
    assert_eq!(s, HttpStatusCode::FORBIDDEN);

    let (s, v) = app
        .call(app.client.post(app.url("/api/admin/products")).bearer_auth(&admin).json(&json!({
            "title": "Brake pad set",
            "description": "Front ceramic pads",
            "price": "1250.00",
            "sku": format!("BP-{tag}"),
            "make": "Toyota",
            "model": "Corolla",
            "year": 2018
        })))
        .await?;
    assert_eq!(s, HttpStatusCode::CREATED, "{v}");
    let product_id = v["data"]["id"].as_str().unwrap_or_default().to_string();

    let (s, v) = app.call(app.client.get(app.url(&format!("/api/products/{product_id}")))).await?;
    assert_eq!(s, HttpStatusCode::OK);
    assert_eq!(v["data"]["title"], json!("Brake pad set"));

    let (s, _) = app.call(app.client.post(app.url("/api/checkout/initiate")).bearer_auth(&buyer)).await?;
    assert_eq!(s, HttpStatusCode::BAD_REQUEST, "empty cart cannot be checked out");

    let (s, v) = app
        .call(
            app.client
                .post(app.url("/api/cart/items"))
                .bearer_auth(&buyer)
                .json(&json!({ "productId": product_id, "quantity": 2 })),
        )
        .await?;
    assert_eq!(s, HttpStatusCode::OK, "{v}");
    assert_eq!(v["data"]["itemCount"], json!(2));
    assert_eq!(v["data"]["subtotal"], json!("2500.00"));

    let (s, v) = app.call(app.client.post(app.url("/api/checkout/initiate")).bearer_auth(&buyer)).await?;
    assert_eq!(s, HttpStatusCode::OK, "{v}");
    let reference = v["data"]["reference"].as_str().unwrap_or_default().to_string();
    assert!(v["data"]["authorization_url"].as_str().unwrap_or_default().ends_with(&reference));

    let (s, v) = deliver(&app, &reference, 250000).await?;
    assert_eq!(s, HttpStatusCode::OK, "{v}");
    assert_eq!(v["data"]["status"], json!("ok"));
    let order_id = v["data"]["orderId"].as_str().unwrap_or_default().to_string();
    assert!(!order_id.is_empty());

    // 重复投递不会再建单
    let (s, v) = deliver(&app, &reference, 250000).await?;
    assert_eq!(s, HttpStatusCode::OK);
    assert_eq!(v["data"]["orderId"], Value::Null);

    let (s, v) = app.call(app.client.get(app.url("/api/orders")).bearer_auth(&buyer)).await?;
    assert_eq!(s, HttpStatusCode::OK);
    let orders = v["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], json!(order_id));
    assert_eq!(orders[0]["status"], json!("PAID"));

    let (_, v) = app.call(app.client.get(app.url("/api/cart")).bearer_auth(&buyer)).await?;
    assert_eq!(v["data"]["items"], json!([]));

    let dispute = json!({ "orderId": order_id, "title": "Wrong part", "description": "Received rear pads instead" });
    let (s, v) = app.call(app.client.post(app.url("/api/disputes")).bearer_auth(&buyer).json(&dispute)).await?;
    assert_eq!(s, HttpStatusCode::CREATED, "{v}");
    let (s, _) = app.call(app.client.post(app.url("/api/disputes")).bearer_auth(&buyer).json(&dispute)).await?;
    assert_eq!(s, HttpStatusCode::CONFLICT);

    let buyer_id = app.state.auth.verify_token(&buyer)?.sub;
    let (s, v) = app
        .call(app.client.get(app.url(&format!("/api/admin/orders?userId={buyer_id}"))).bearer_auth(&admin))
        .await?;
    assert_eq!(s, HttpStatusCode::OK);
    assert_eq!(v["data"]["pagination"]["total"], json!(1));

    let (s, _) = app
        .call(app.client.post(app.url("/api/auth/forgot-password")).json(&json!({ "email": email })))
        .await?;
    assert_eq!(s, HttpStatusCode::OK);

    Ok(())
}
