use std::sync::Arc;
use std::time::Instant;

use sea_orm::DatabaseConnection;

use configs::AppConfig;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::repository::AuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::checkout::{CheckoutService, PaymentGateway, PaystackClient};
use service::email::{Mailer, ZeptoMailer};
use service::uploads::{CloudinaryStore, ImageStore};

/// Outbound clients; swapped for in-memory doubles in tests.
pub struct Integrations {
    pub mailer: Arc<dyn Mailer>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub images: Arc<dyn ImageStore>,
}

impl Integrations {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            mailer: Arc::new(ZeptoMailer::new(cfg.email.clone())?),
            gateway: Arc::new(PaystackClient::new(cfg.paystack.clone())?),
            images: Arc::new(CloudinaryStore::new(cfg.storage.clone())?),
        })
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: Arc<AuthService<dyn AuthRepository>>,
    pub checkout: Arc<CheckoutService>,
    pub images: Arc<dyn ImageStore>,
    pub max_upload_bytes: usize,
    pub started_at: Instant,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, cfg: &AppConfig, integrations: Integrations) -> Self {
        let repo: Arc<dyn AuthRepository> = Arc::new(SeaOrmAuthRepository::new(db.clone()));
        let auth = AuthService::new(repo, AuthConfig::from_settings(&cfg.auth, &cfg.email))
            .with_mailer(integrations.mailer.clone());
        let checkout = CheckoutService::new(db.clone(), integrations.gateway, cfg.paystack.clone())
            .with_mailer(integrations.mailer);
        Self {
            db,
            auth: Arc::new(auth),
            checkout: Arc::new(checkout),
            images: integrations.images,
            max_upload_bytes: cfg.storage.max_upload_bytes,
            started_at: Instant::now(),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.auth.config().jwt_secret
    }
}
