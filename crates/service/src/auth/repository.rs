use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, ResetToken};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    /// Insert the user and its credentials together; neither is kept if either write fails.
    async fn create_user_with_password(
        &self,
        email: &str,
        full_name: &str,
        roles: &[String],
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;

    async fn store_reset_token(&self, user_id: Uuid, token: &str, expires_at: DateTime<FixedOffset>) -> Result<(), AuthError>;
    /// Consume a live reset token and store the new password in one step.
    /// Returns the owner's id, or `None` when the token is unknown, used or expired.
    async fn redeem_reset_token(&self, token: &str, password_hash: String, password_algorithm: String) -> Result<Option<Uuid>, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>,   // key: email
        creds: Mutex<HashMap<Uuid, Credentials>>,  // key: user_id
        resets: Mutex<HashMap<String, ResetToken>>, // key: token
    }

    impl MockAuthRepository {
        /// Snapshot of issued reset tokens for a user (test helper).
        pub fn reset_tokens_for(&self, user_id: Uuid) -> Vec<ResetToken> {
            self.resets.lock().unwrap().values().filter(|t| t.user_id == user_id).cloned().collect()
        }

        /// Force a token's expiry (test helper).
        pub fn expire_reset_token(&self, token: &str) {
            if let Some(t) = self.resets.lock().unwrap().get_mut(token) {
                t.expires_at = (chrono::Utc::now() - chrono::Duration::minutes(1)).into();
            }
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(&email.to_lowercase()).cloned())
        }

        async fn create_user_with_password(
            &self,
            email: &str,
            full_name: &str,
            roles: &[String],
            password_hash: String,
            password_algorithm: String,
        ) -> Result<AuthUser, AuthError> {
            let roles = models::user::normalize_roles(roles)?;
            if password_hash.trim().is_empty() {
                return Err(AuthError::Validation("password hash required".into()));
            }
            let key = email.to_lowercase();
            let mut users = self.users.lock().unwrap();
            if users.contains_key(&key) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser { id: Uuid::new_v4(), email: key.clone(), full_name: full_name.to_string(), roles };
            self.creds
                .lock()
                .unwrap()
                .insert(user.id, Credentials { user_id: user.id, password_hash, password_algorithm });
            users.insert(key, user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn store_reset_token(&self, user_id: Uuid, token: &str, expires_at: DateTime<FixedOffset>) -> Result<(), AuthError> {
            let mut resets = self.resets.lock().unwrap();
            resets.insert(token.to_string(), ResetToken { id: Uuid::new_v4(), user_id, token: token.to_string(), expires_at, used: false });
            Ok(())
        }

        async fn redeem_reset_token(&self, token: &str, password_hash: String, password_algorithm: String) -> Result<Option<Uuid>, AuthError> {
            let mut resets = self.resets.lock().unwrap();
            let Some(t) = resets.get_mut(token) else { return Ok(None) };
            if t.used || t.expires_at.with_timezone(&chrono::Utc) <= chrono::Utc::now() {
                return Ok(None);
            }
            t.used = true;
            let user_id = t.user_id;
            self.creds
                .lock()
                .unwrap()
                .insert(user_id, Credentials { user_id, password_hash, password_algorithm });
            Ok(Some(user_id))
        }
    }
}
