use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use knowledge_hub_core::models::{
    Document, DocumentId, DocumentShare, DocumentSummary, PageRequest, Permission, UserId,
    VersionEntry,
};
use knowledge_hub_core::services::{DocumentDetail, NewDocument};
use knowledge_hub_core::storage::DocumentPatch;
use serde::{Deserialize, Deserializer};

use super::extract::{AppJson, AppPath, AuthContext, MaybeAuth};
use super::{ApiError, ApiResponse, ApiResult, AppState};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents", get(list_documents).post(create_document))
        .route(
            "/documents/{id}",
            get(get_document).put(update_document).delete(delete_document),
        )
        .route(
            "/documents/{id}/share",
            post(share_document).delete(unshare_document),
        )
        .route("/documents/{id}/versions", get(list_versions))
        .route("/documents/{id}/versions/{version_id}", get(get_version))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    is_public: bool,
    #[serde(default)]
    mentions: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest {
    title: Option<String>,
    content: Option<String>,
    is_public: Option<bool>,
    #[serde(default)]
    mentions: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareRequest {
    #[serde(deserialize_with = "user_id")]
    user_id: UserId,
    permission: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnshareRequest {
    #[serde(deserialize_with = "user_id")]
    user_id: UserId,
}

/// Accepts `7` as well as `"7"`.
fn user_id<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(UserId),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(id) => Ok(id),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom("userId must be a user id")),
    }
}

async fn list_documents(
    State(state): State<AppState>,
    auth: MaybeAuth,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<DocumentSummary>> {
    let page = PageRequest::parse(params.page.as_deref(), params.limit.as_deref(), 10);
    let listed = state
        .documents
        .list(auth.user_id(), params.search.as_deref(), page)
        .await?;
    Ok(Json(ApiResponse::paged(listed)))
}

async fn get_document(
    State(state): State<AppState>,
    auth: MaybeAuth,
    AppPath(id): AppPath<DocumentId>,
) -> ApiResult<DocumentDetail> {
    let detail = state.documents.get(id, auth.user_id()).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

async fn create_document(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(req): AppJson<CreateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Document>>), ApiError> {
    let document = state
        .documents
        .create(
            auth.user.id,
            NewDocument {
                title: req.title,
                content: req.content,
                is_public: req.is_public,
                mentions: req.mentions,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(document).with_message("Document created successfully")),
    ))
}

async fn update_document(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<DocumentId>,
    AppJson(req): AppJson<UpdateRequest>,
) -> ApiResult<Document> {
    let patch = DocumentPatch {
        title: req.title,
        content: req.content,
        is_public: req.is_public,
    };
    let document = state
        .documents
        .update(id, auth.user.id, patch, req.mentions)
        .await?;
    Ok(Json(
        ApiResponse::ok(document).with_message("Document updated successfully"),
    ))
}

async fn delete_document(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<DocumentId>,
) -> ApiResult<()> {
    state.documents.delete(id, auth.user.id).await?;
    Ok(Json(ApiResponse::message("Document deleted successfully")))
}

async fn share_document(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<DocumentId>,
    AppJson(req): AppJson<ShareRequest>,
) -> ApiResult<DocumentShare> {
    let permission: Permission = req.permission.parse()?;
    let share = state
        .documents
        .share(id, auth.user.id, req.user_id, permission)
        .await?;
    Ok(Json(
        ApiResponse::ok(share).with_message("Document shared successfully"),
    ))
}

async fn unshare_document(
    State(state): State<AppState>,
    auth: AuthContext,
    AppPath(id): AppPath<DocumentId>,
    AppJson(req): AppJson<UnshareRequest>,
) -> ApiResult<()> {
    state
        .documents
        .unshare(id, auth.user.id, req.user_id)
        .await?;
    Ok(Json(ApiResponse::message("Share removed successfully")))
}

async fn list_versions(
    State(state): State<AppState>,
    auth: MaybeAuth,
    AppPath(id): AppPath<DocumentId>,
) -> ApiResult<Vec<VersionEntry>> {
    let versions = state.documents.versions(id, auth.user_id()).await?;
    Ok(Json(ApiResponse::ok(versions)))
}

async fn get_version(
    State(state): State<AppState>,
    auth: MaybeAuth,
    AppPath((id, version_id)): AppPath<(DocumentId, i64)>,
) -> ApiResult<VersionEntry> {
    let version = state
        .documents
        .version(id, version_id, auth.user_id())
        .await?;
    Ok(Json(ApiResponse::ok(version)))
}
