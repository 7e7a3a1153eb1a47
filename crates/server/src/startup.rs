use std::{future::Future, net::SocketAddr};

use axum::Router;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use common::env::{ensure_env, INTEGRATION_KEYS};
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;

use crate::errors::StartupError;
use crate::routes;
use crate::state::{Integrations, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Connect, migrate, seed the admin account and assemble shared state.
pub async fn prepare(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    migration::Migrator::up(&db, None)
        .await
        .map_err(|e| StartupError::Database(format!("migrations failed: {e}")))?;
    info!("database migrations applied");

    let state = ServerState::new(db, cfg, Integrations::from_config(cfg)?);

    // 管理员种子失败不阻断启动
    match state.auth.seed_admin_if_missing(&cfg.admin_seed).await {
        Ok(true) => info!(email = %cfg.admin_seed.email, "seeded admin account"),
        Ok(false) => {}
        Err(e) => error!(error = %e, "admin seed failed"),
    }
    Ok(state)
}

/// Public entry: build the app and serve until `shutdown` resolves.
pub async fn run<F>(shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    ensure_env(INTEGRATION_KEYS)?;

    let state = prepare(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("server drained");
    Ok(())
}
