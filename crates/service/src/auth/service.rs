use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::email::{send_best_effort, EmailTemplate, Mailer, TemplateEmail};

use super::domain::{AuthSession, AuthUser, LoginInput, RegisterInput, ResetPasswordInput};
use super::errors::AuthError;
use super::password::{self, ALGORITHM};
use super::repository::AuthRepository;
use super::token;

/// Answer returned by forgot-password whether or not the account exists.
pub const RESET_REQUESTED_MESSAGE: &str = "If the email exists, a reset link will be sent";

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub reset_token_ttl: Duration,
    /// Base URL of the storefront; reset links point at `{base}/reset-password`.
    pub frontend_url: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::days(7),
            reset_token_ttl: Duration::minutes(30),
            frontend_url: "http://localhost:3000".into(),
        }
    }

    pub fn from_settings(auth: &configs::AuthSettings, email: &configs::EmailConfig) -> Self {
        Self {
            jwt_secret: auth.jwt_secret.clone(),
            token_ttl: Duration::hours(auth.token_ttl_hours),
            reset_token_ttl: Duration::minutes(auth.reset_token_ttl_minutes),
            frontend_url: email.frontend_url.clone(),
        }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    cfg: AuthConfig,
    mailer: Option<Arc<dyn Mailer>>,
}

impl<R: AuthRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg, mailer: None } }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn config(&self) -> &AuthConfig { &self.cfg }

    async fn notify(&self, email: TemplateEmail) {
        if let Some(m) = &self.mailer {
            send_best_effort(m.as_ref(), email).await;
        }
    }

    /// Register a new customer with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("secret"));
    /// let input = RegisterInput { email: "user@example.com".into(), full_name: "Test".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// assert_eq!(user.roles, vec!["CUSTOMER"]);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        models::user::validate_email(&input.email)?;
        models::user::validate_name(&input.full_name)?;
        password::validate_password(&input.password)?;

        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let user = self.create_with_password(&input.email, &input.full_name, &input.password, &[]).await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");

        self.notify(TemplateEmail {
            to: user.email.clone(),
            to_name: Some(user.full_name.clone()),
            subject: "Welcome to Auto Shop".into(),
            template: EmailTemplate::Welcome,
            merge_info: json!({ "name": user.full_name }),
        })
        .await;
        Ok(user)
    }

    /// Create an account with arbitrary roles (admin tooling, seeding).
    pub async fn create_with_password(&self, email: &str, full_name: &str, password: &str, roles: &[String]) -> Result<AuthUser, AuthError> {
        password::validate_password(password)?;
        let hash = password::hash_password(password)?;
        self.repo
            .create_user_with_password(email, full_name, roles, hash, ALGORITHM.to_string())
            .await
    }

    /// Authenticate a user and issue an access token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig::new("secret"));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), full_name: "N".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.access_token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        if models::user::validate_email(&input.email).is_err() || input.password.is_empty() {
            return Err(AuthError::Unauthorized);
        }
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !password::verify_password(&input.password, &cred.password_hash)? {
            return Err(AuthError::Unauthorized);
        }

        let access_token = token::issue(&self.cfg.jwt_secret, &user, self.cfg.token_ttl)?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, access_token })
    }

    /// Decode a bearer token into its claims.
    pub fn verify_token(&self, raw: &str) -> Result<token::Claims, AuthError> {
        token::verify(&self.cfg.jwt_secret, raw)
    }

    /// Issue a reset token and email a reset link. Unknown emails succeed
    /// silently so the endpoint cannot be used to probe for accounts.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.repo.find_user_by_email(email).await? else {
            debug!("forgot-password for unknown email");
            return Ok(());
        };
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        let expires_at = (Utc::now() + self.cfg.reset_token_ttl).into();
        self.repo.store_reset_token(user.id, &token, expires_at).await?;
        info!(user_id = %user.id, "password_reset_requested");

        let link = format!("{}/reset-password?token={}", self.cfg.frontend_url, token);
        self.notify(TemplateEmail {
            to: user.email.clone(),
            to_name: Some(user.full_name.clone()),
            subject: "Reset your password".into(),
            template: EmailTemplate::PasswordReset,
            merge_info: json!({ "name": user.full_name, "resetLink": link }),
        })
        .await;
        Ok(())
    }

    #[instrument(skip(self, input))]
    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<(), AuthError> {
        password::validate_password(&input.password)?;
        let hash = password::hash_password(&input.password)?;
        let user_id = self.repo
            .redeem_reset_token(input.token.trim(), hash, ALGORITHM.to_string())
            .await?
            .ok_or(AuthError::InvalidResetToken)?;
        info!(user_id = %user_id, "password_reset_completed");
        Ok(())
    }

    /// Create the bootstrap admin account unless that email already exists.
    pub async fn seed_admin_if_missing(&self, seed: &configs::AdminSeedConfig) -> Result<bool, AuthError> {
        if !seed.enabled {
            return Ok(false);
        }
        if self.repo.find_user_by_email(&seed.email).await?.is_some() {
            return Ok(false);
        }
        let roles = vec![models::status::Role::Admin.as_str().to_string()];
        let user = self.create_with_password(&seed.email, &seed.full_name, &seed.password, &roles).await?;
        info!(user_id = %user.id, email = %user.email, "admin_seeded");
        Ok(true)
    }
}
