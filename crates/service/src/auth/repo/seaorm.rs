use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use uuid::Uuid;

use models::{password_reset_token, user, user_credentials};

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn repo_err(e: DbErr) -> AuthError {
    AuthError::Repository(e.to_string())
}

fn to_credentials(c: user_credentials::Model) -> Credentials {
    Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = user::find_by_email(&self.db, email).await?;
        Ok(res.map(AuthUser::from))
    }

    async fn create_user_with_password(
        &self,
        email: &str,
        full_name: &str,
        roles: &[String],
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        let created = user::create(&txn, email, full_name, roles).await?;
        user_credentials::upsert_password(&txn, created.id, password_hash, &password_algorithm).await?;
        txn.commit().await.map_err(repo_err)?;
        Ok(created.into())
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = user_credentials::find_by_user(&self.db, user_id).await?;
        Ok(res.map(to_credentials))
    }

    async fn store_reset_token(&self, user_id: Uuid, token: &str, expires_at: DateTime<FixedOffset>) -> Result<(), AuthError> {
        let ttl = expires_at.with_timezone(&Utc) - Utc::now();
        password_reset_token::issue(&self.db, user_id, token, ttl).await?;
        Ok(())
    }

    async fn redeem_reset_token(&self, token: &str, password_hash: String, password_algorithm: String) -> Result<Option<Uuid>, AuthError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        // 条件更新抢占令牌，并发请求只有一个能命中
        let Some(claimed) = password_reset_token::claim(&txn, token).await? else {
            txn.rollback().await.map_err(repo_err)?;
            return Ok(None);
        };
        user_credentials::upsert_password(&txn, claimed.user_id, password_hash, &password_algorithm).await?;
        txn.commit().await.map_err(repo_err)?;
        Ok(Some(claimed.user_id))
    }
}
