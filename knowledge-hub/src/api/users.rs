use axum::{
    extract::{Query, State},
    routing::{get, put},
    Json, Router,
};
use knowledge_hub_core::models::{
    DocumentSummary, Notification, PageRequest, Role, SharedDocument, User, UserId, UserMention,
    UserSummary,
};
use serde::Deserialize;

use super::extract::{AppJson, AppPath, AuthContext};
use super::{ApiResponse, ApiResult, AppState};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/search", get(search_users))
        .route("/users/profile", put(update_profile))
        .route("/users/notifications", get(list_notifications))
        .route("/users/notifications/read-all", put(mark_all_read))
        .route("/users/notifications/{id}/read", put(mark_read))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/role", put(set_role))
        .route("/users/{id}/documents", get(user_documents))
        .route("/users/{id}/shared-documents", get(shared_documents))
        .route("/users/{id}/mentions", get(user_mentions))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

#[derive(Deserialize)]
struct PageParams {
    page: Option<String>,
    limit: Option<String>,
}

impl PageParams {
    fn request(&self, default_limit: u32) -> PageRequest {
        PageRequest::parse(self.page.as_deref(), self.limit.as_deref(), default_limit)
    }
}

#[derive(Deserialize)]
struct ProfileRequest {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
struct RoleRequest {
    role: String,
}

async fn list_users(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Vec<User>> {
    let users = state.accounts.list_users(&auth.user).await?;
    Ok(Json(ApiResponse::ok(users)))
}

async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<UserSummary>> {
    let users = state.accounts.search_users(&params.query).await?;
    Ok(Json(ApiResponse::ok(users)))
}

async fn get_user(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<UserId>,
) -> ApiResult<User> {
    let user = state.accounts.get_user(&auth.user, id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

async fn update_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(req): AppJson<ProfileRequest>,
) -> ApiResult<User> {
    let user = state
        .accounts
        .update_profile(&auth.user, req.name.as_deref(), req.email.as_deref())
        .await?;
    Ok(Json(
        ApiResponse::ok(user).with_message("Profile updated successfully"),
    ))
}

async fn set_role(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<UserId>,
    AppJson(req): AppJson<RoleRequest>,
) -> ApiResult<User> {
    let role: Role = req.role.parse()?;
    let user = state.accounts.set_role(&auth.user, id, role).await?;
    Ok(Json(ApiResponse::ok(user).with_message("Role updated successfully")))
}

async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<Notification>> {
    let page = state
        .accounts
        .notifications(&auth.user, params.request(20))
        .await?;
    Ok(Json(ApiResponse::paged(page)))
}

async fn mark_read(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<i64>,
) -> ApiResult<()> {
    state.accounts.mark_read(&auth.user, id).await?;
    Ok(Json(ApiResponse::message("Notification marked as read")))
}

async fn mark_all_read(State(state): State<AppState>, auth: AuthContext) -> ApiResult<()> {
    state.accounts.mark_all_read(&auth.user).await?;
    Ok(Json(ApiResponse::message("All notifications marked as read")))
}

async fn user_documents(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<UserId>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<DocumentSummary>> {
    let page = state
        .accounts
        .documents_of(&auth.user, id, params.request(10))
        .await?;
    Ok(Json(ApiResponse::paged(page)))
}

async fn shared_documents(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<UserId>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<SharedDocument>> {
    let page = state
        .accounts
        .shared_with(&auth.user, id, params.request(10))
        .await?;
    Ok(Json(ApiResponse::paged(page)))
}

async fn user_mentions(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<UserId>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<UserMention>> {
    let page = state
        .accounts
        .mentions_of(&auth.user, id, params.request(10))
        .await?;
    Ok(Json(ApiResponse::paged(page)))
}
