use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;
use tracing::warn;

pub const DEV_JWT_SECRET: &str = "dev_secret_change_me";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub paystack: PaystackConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub admin_seed: AdminSeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 3000, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// JWT signing settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_reset_ttl_minutes")]
    pub reset_token_ttl_minutes: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            reset_token_ttl_minutes: default_reset_ttl_minutes(),
        }
    }
}

fn default_jwt_secret() -> String { DEV_JWT_SECRET.to_string() }
fn default_token_ttl_hours() -> i64 { 24 * 7 }
fn default_reset_ttl_minutes() -> i64 { 30 }

/// Payment gateway (Paystack) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackConfig {
    #[serde(default = "default_paystack_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub secret_key: String,
    /// When empty, webhook signatures are not verified.
    #[serde(default)]
    pub webhook_secret: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: default_paystack_base_url(),
            secret_key: String::new(),
            webhook_secret: String::new(),
            currency: default_currency(),
            callback_url: None,
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_paystack_base_url() -> String { "https://api.paystack.co".to_string() }
fn default_currency() -> String { "NGN".to_string() }
fn default_http_timeout() -> u64 { 15 }

/// Transactional email (ZeptoMail) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_zepto_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_mail_from")]
    pub from_address: String,
    #[serde(default = "default_mail_from_name")]
    pub from_name: String,
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    #[serde(default)]
    pub templates: EmailTemplates,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: default_zepto_url(),
            api_key: String::new(),
            from_address: default_mail_from(),
            from_name: default_mail_from_name(),
            frontend_url: default_frontend_url(),
            templates: EmailTemplates::default(),
        }
    }
}

fn default_zepto_url() -> String { "https://api.zeptomail.com/v1.1".to_string() }
fn default_mail_from() -> String { "noreply@autoshop.com".to_string() }
fn default_mail_from_name() -> String { "Auto Shop".to_string() }
fn default_frontend_url() -> String { "http://localhost:3000".to_string() }

/// Provider-side template ids keyed by purpose.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailTemplates {
    #[serde(default = "tpl_welcome")]
    pub welcome: String,
    #[serde(default = "tpl_payment_initiated")]
    pub payment_initiated: String,
    #[serde(default = "tpl_order_confirmation")]
    pub order_confirmation: String,
    #[serde(default = "tpl_password_reset")]
    pub password_reset: String,
}

impl Default for EmailTemplates {
    fn default() -> Self {
        Self {
            welcome: tpl_welcome(),
            payment_initiated: tpl_payment_initiated(),
            order_confirmation: tpl_order_confirmation(),
            password_reset: tpl_password_reset(),
        }
    }
}

fn tpl_welcome() -> String { "welcome".to_string() }
fn tpl_payment_initiated() -> String { "payment_initiated".to_string() }
fn tpl_order_confirmation() -> String { "order_confirmation".to_string() }
fn tpl_password_reset() -> String { "password_reset".to_string() }

/// Image storage (Cloudinary) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_folder(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

fn default_folder() -> String { "auto-shop".to_string() }
fn default_max_upload() -> usize { 10 * 1024 * 1024 }

impl StorageConfig {
    pub fn is_configured(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

/// Bootstrap admin account created at startup when missing.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_admin_email")]
    pub email: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub full_name: String,
}

impl Default for AdminSeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            email: default_admin_email(),
            password: default_admin_password(),
            full_name: default_admin_name(),
        }
    }
}

fn default_true() -> bool { true }
fn default_admin_email() -> String { "admin@example.com".to_string() }
fn default_admin_password() -> String { "Admin123!@#".to_string() }
fn default_admin_name() -> String { "Admin User".to_string() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if std::path::Path::new(&path).exists() {
        load_from_file(&path)
    } else {
        Ok(AppConfig::default())
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.apply_overrides(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// 环境变量优先于 TOML；`lookup` 便于测试注入
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SERVER_HOST") { self.server.host = v; }
        if let Some(p) = get("SERVER_PORT").or_else(|| get("PORT")).and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = p;
        }
        if let Some(w) = get("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(v) = get("DATABASE_URL") { self.database.url = v; }
        if let Some(v) = get("JWT_SECRET") { self.auth.jwt_secret = v; }

        if let Some(v) = get("PAYSTACK_SECRET_KEY") { self.paystack.secret_key = v; }
        if let Some(v) = get("PAYSTACK_WEBHOOK_SECRET") { self.paystack.webhook_secret = v; }
        if let Some(v) = get("PAYSTACK_BASE_URL") { self.paystack.base_url = v; }
        if let Some(v) = get("PAYSTACK_CALLBACK_URL") { self.paystack.callback_url = Some(v); }

        if let Some(v) = get("ZEPTO_API_URL") { self.email.api_url = v; }
        if let Some(v) = get("ZEPTO_API_KEY") { self.email.api_key = v; }
        if let Some(v) = get("MAIL_FROM") { self.email.from_address = v; }
        if let Some(v) = get("MAIL_FROM_NAME") { self.email.from_name = v; }
        if let Some(v) = get("FRONTEND_URL") { self.email.frontend_url = v; }

        if let Some(v) = get("CLOUDINARY_CLOUD_NAME") { self.storage.cloud_name = v; }
        if let Some(v) = get("CLOUDINARY_API_KEY") { self.storage.api_key = v; }
        if let Some(v) = get("CLOUDINARY_API_SECRET") { self.storage.api_secret = v; }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.paystack.normalize();
        self.email.normalize();
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url 为空；请在 config.toml 或环境变量 DATABASE_URL 中提供"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url 必须以 postgresql:// 或 postgres:// 开头"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections 必须 >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections 必须 >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database 超时配置必须为正整数秒"));
        }
        Ok(())
    }
}

impl AuthSettings {
    fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret must not be empty"));
        }
        if self.jwt_secret == DEV_JWT_SECRET {
            warn!("auth.jwt_secret is the development default; set JWT_SECRET in production");
        }
        if self.token_ttl_hours <= 0 || self.reset_token_ttl_minutes <= 0 {
            return Err(anyhow!("auth token lifetimes must be positive"));
        }
        Ok(())
    }
}

impl PaystackConfig {
    fn normalize(&mut self) {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        self.currency = self.currency.trim().to_uppercase();
        if self.currency.is_empty() {
            self.currency = default_currency();
        }
        if self.secret_key.is_empty() {
            warn!("PAYSTACK_SECRET_KEY not set; checkout initiation will fail");
        }
    }
}

impl EmailConfig {
    fn normalize(&mut self) {
        self.api_url = self.api_url.trim_end_matches('/').to_string();
        self.frontend_url = self.frontend_url.trim_end_matches('/').to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.auth.token_ttl_hours, 168);
        assert_eq!(cfg.auth.reset_token_ttl_minutes, 30);
        assert_eq!(cfg.paystack.base_url, "https://api.paystack.co");
        assert_eq!(cfg.email.from_address, "noreply@autoshop.com");
        assert_eq!(cfg.storage.folder, "auto-shop");
        assert_eq!(cfg.admin_seed.email, "admin@example.com");
    }

    #[test]
    fn toml_sections_are_optional() {
        let cfg = load_from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://u:p@localhost/shop"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.email.api_url, "https://api.zeptomail.com/v1.1");
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut cfg = AppConfig::default();
        cfg.apply_overrides(env_of(&[
            ("DATABASE_URL", "postgres://x@db/shop"),
            ("SERVER_PORT", "9090"),
            ("JWT_SECRET", "s3cret"),
            ("PAYSTACK_SECRET_KEY", "sk_test"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("MAIL_FROM", ""),
        ]));
        assert_eq!(cfg.database.url, "postgres://x@db/shop");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.auth.jwt_secret, "s3cret");
        assert_eq!(cfg.paystack.secret_key, "sk_test");
        assert_eq!(cfg.storage.cloud_name, "demo");
        // 空值不覆盖
        assert_eq!(cfg.email.from_address, "noreply@autoshop.com");
    }

    #[test]
    fn validate_rejects_non_postgres_url() {
        let mut cfg = AppConfig::default();
        cfg.database.url = "mysql://localhost/db".into();
        assert!(cfg.normalize_and_validate().is_err());
        cfg.database.url = "postgres://localhost/db".into();
        assert!(cfg.normalize_and_validate().is_ok());
    }

    #[test]
    fn normalize_trims_trailing_slashes_and_currency() {
        let mut cfg = AppConfig::default();
        cfg.database.url = "postgres://localhost/db".into();
        cfg.paystack.base_url = "https://api.paystack.co/".into();
        cfg.paystack.currency = " ngn ".into();
        cfg.email.frontend_url = "https://shop.example.com/".into();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.paystack.base_url, "https://api.paystack.co");
        assert_eq!(cfg.paystack.currency, "NGN");
        assert_eq!(cfg.email.frontend_url, "https://shop.example.com");
    }

    #[test]
    fn storage_requires_all_credentials() {
        let mut s = StorageConfig::default();
        assert!(!s.is_configured());
        s.cloud_name = "c".into();
        s.api_key = "k".into();
        assert!(!s.is_configured());
        s.api_secret = "s".into();
        assert!(s.is_configured());
    }
}
