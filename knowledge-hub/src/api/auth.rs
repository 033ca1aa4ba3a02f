use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use knowledge_hub_core::models::User;
use knowledge_hub_core::services::Session;
use serde::Deserialize;
use tracing::debug;

use super::extract::{AppJson, AuthContext};
use super::{ApiError, ApiResponse, ApiResult, AppState};

const FORGOT_PASSWORD_REPLY: &str =
    "If an account exists for that email, a password reset link has been sent";

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me).delete(delete_me))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

#[derive(Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct ForgotPasswordRequest {
    #[serde(default)]
    email: String,
}

#[derive(Deserialize)]
struct ResetPasswordRequest {
    #[serde(default)]
    token: String,
    #[serde(default)]
    password: String,
}

async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Session>>), ApiError> {
    let session = state
        .accounts
        .register(&req.name, &req.email, &req.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(session).with_message("User registered successfully")),
    ))
}

async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Session> {
    let session = state.accounts.login(&req.email, &req.password).await?;
    Ok(Json(ApiResponse::ok(session).with_message("Login successful")))
}

async fn logout(State(state): State<AppState>, auth: AuthContext) -> ApiResult<()> {
    state.accounts.logout(&auth.claims).await?;
    Ok(Json(ApiResponse::message("Logged out successfully")))
}

async fn me(auth: AuthContext) -> ApiResult<User> {
    Ok(Json(ApiResponse::ok(auth.user)))
}

async fn delete_me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<()> {
    state.accounts.delete_account(&auth.user).await?;
    Ok(Json(ApiResponse::message("Account deleted successfully")))
}

/// Answers the same way whether or not the address is registered.
async fn forgot_password(
    State(state): State<AppState>,
    AppJson(req): AppJson<ForgotPasswordRequest>,
) -> ApiResult<()> {
    if let Some(ticket) = state.accounts.forgot_password(&req.email).await? {
        debug!(
            user = ticket.user_id,
            expires_at = %ticket.expires_at,
            link = %format!("/reset-password?token={}", ticket.token),
            "password reset link issued"
        );
    }
    Ok(Json(ApiResponse::message(FORGOT_PASSWORD_REPLY)))
}

async fn reset_password(
    State(state): State<AppState>,
    AppJson(req): AppJson<ResetPasswordRequest>,
) -> ApiResult<()> {
    state
        .accounts
        .reset_password(&req.token, &req.password)
        .await?;
    Ok(Json(ApiResponse::message("Password has been reset successfully")))
}
