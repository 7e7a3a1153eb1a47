use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use models::status::Role;
use service::auth::token;

use crate::errors::ApiError;
use crate::state::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

/// Caller identity injected into request extensions by [`require_auth`].
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == Role::Admin.as_str())
    }
}

/// 读取 Authorization: Bearer <token>；缺失时回退到 auth_token Cookie
fn bearer_or_cookie(req: &Request) -> Result<String, ApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return h
            .strip_prefix("Bearer ")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                tracing::warn!(path = %req.uri().path(), "invalid Authorization format (expect Bearer)");
                ApiError::Unauthorized("Invalid authorization header".into())
            });
    }
    let jar = CookieJar::from_headers(req.headers());
    match jar.get(AUTH_COOKIE).map(|c| c.value().to_string()) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(ApiError::Unauthorized("Authentication required".into())),
    }
}

/// Verify the access token and attach [`AuthContext`]; 401 on missing or invalid tokens.
pub async fn require_auth(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let raw = bearer_or_cookie(&req)?;
    let claims = token::verify(state.jwt_secret(), &raw).map_err(|e| {
        tracing::warn!(path = %req.uri().path(), err = %e, "token validation failed");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;
    req.extensions_mut().insert(AuthContext { user_id: claims.sub, email: claims.email, roles: claims.roles });
    Ok(next.run(req).await)
}

/// Role guard for the admin subtree. Must run after [`require_auth`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let Some(ctx) = req.extensions().get::<AuthContext>() else {
        return Err(ApiError::Unauthorized("Authentication required".into()));
    };
    if !ctx.is_admin() {
        tracing::warn!(user_id = %ctx.user_id, path = %req.uri().path(), "admin access denied");
        return Err(ApiError::Forbidden("Admin access required".into()));
    }
    Ok(next.run(req).await)
}
