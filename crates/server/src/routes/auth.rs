use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use common::types::ApiResponse;
use service::auth::domain::{AuthSession, ForgotPasswordInput, LoginInput, RegisterInput, ResetPasswordInput};
use service::auth::service::RESET_REQUESTED_MESSAGE;
use service::users;
use service::views::PublicUser;

use crate::auth::{AuthContext, AUTH_COOKIE};
use crate::errors::ApiError;
use crate::extract::ApiJson;
use crate::routes::{done, ok, ApiResult};
use crate::state::ServerState;

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

#[utoipa::path(post, path = "/api/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<ApiResponse<PublicUser>>), ApiError> {
    let created = state.auth.register(input).await?;
    let user = users::me(&state.db, created.id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("User registered successfully", user))))
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<(CookieJar, Json<ApiResponse<AuthSession>>), ApiError> {
    let session = state.auth.login(input).await?;
    let jar = jar.add(session_cookie(session.access_token.clone()));
    Ok((jar, Json(ApiResponse::ok("Login successful", session))))
}

#[utoipa::path(post, path = "/api/auth/logout", tag = "auth", responses((status = 200, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<()>>) {
    // 无论请求是否带 cookie，都下发过期的同名 cookie
    let mut expired = session_cookie(String::new());
    expired.make_removal();
    (jar.add(expired), Json(ApiResponse::message("Logged out successfully")))
}

#[utoipa::path(post, path = "/api/auth/forgot-password", tag = "auth", request_body = crate::openapi::ForgotPasswordRequest, responses((status = 200, description = "Always succeeds")))]
pub async fn forgot_password(State(state): State<ServerState>, ApiJson(input): ApiJson<ForgotPasswordInput>) -> ApiResult<()> {
    state.auth.forgot_password(&input.email).await?;
    done(RESET_REQUESTED_MESSAGE)
}

#[utoipa::path(post, path = "/api/auth/reset-password", tag = "auth", request_body = crate::openapi::ResetPasswordRequest, responses((status = 200, description = "Password updated"), (status = 400, description = "Invalid or expired token")))]
pub async fn reset_password(State(state): State<ServerState>, ApiJson(input): ApiJson<ResetPasswordInput>) -> ApiResult<()> {
    state.auth.reset_password(input).await?;
    done("Password has been reset successfully")
}

#[utoipa::path(get, path = "/api/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>) -> ApiResult<PublicUser> {
    ok("User retrieved successfully", users::me(&state.db, ctx.user_id).await?)
}
