//! Error taxonomy shared by every service.
//!
//! Database errors are classified here so callers only ever see a short,
//! user-safe message; the full error is logged at the point of conversion.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::error;

use models::errors::ModelError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    /// Message safe to return to clients.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Internal(_) => "An unexpected error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                error!(error = %detail, "unique constraint violation");
                return ServiceError::Conflict("Resource already exists".into());
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                error!(error = %detail, "foreign key violation");
                return ServiceError::Validation("Invalid reference provided".into());
            }
            _ => {}
        }
        match e {
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => {
                ServiceError::NotFound("Requested resource not found".into())
            }
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
                error!(error = %e, "database unavailable");
                ServiceError::Unavailable("Service temporarily unavailable".into())
            }
            other => {
                error!(error = %other, "database error");
                ServiceError::Internal("An error occurred while processing your request".into())
            }
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            ModelError::Db(db) => db.into(),
        }
    }
}

impl From<crate::auth::errors::AuthError> for ServiceError {
    fn from(e: crate::auth::errors::AuthError) -> Self {
        use crate::auth::errors::AuthError;
        match e {
            AuthError::Validation(m) => ServiceError::Validation(m),
            AuthError::InvalidResetToken => ServiceError::Validation(e.to_string()),
            AuthError::Conflict => ServiceError::Conflict(e.to_string()),
            AuthError::NotFound => ServiceError::NotFound(e.to_string()),
            AuthError::Unauthorized => ServiceError::Unauthorized(e.to_string()),
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => {
                error!(error = %e, code = e.code(), "auth internal error");
                ServiceError::Internal(e.to_string())
            }
        }
    }
}
