//! Request extractors: bearer authentication and envelope-aware rejections.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use knowledge_hub_core::auth::Claims;
use knowledge_hub_core::models::User;
use knowledge_hub_core::Error;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ApiError, AppState};

/// An authenticated caller.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user: User,
    pub claims: Claims,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| Error::unauthenticated("Access token required"))?;
        let identity = state.accounts.authenticate(token).await?;
        Ok(Self {
            user: identity.user,
            claims: identity.claims,
        })
    }
}

/// Like [`AuthContext`] but anonymous callers, and callers whose token does
/// not check out, proceed as `None`.
#[derive(Clone, Debug)]
pub struct MaybeAuth(pub Option<AuthContext>);

impl MaybeAuth {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|ctx| ctx.user.id)
    }
}

impl FromRequestParts<AppState> for MaybeAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        match state.accounts.authenticate(token).await {
            Ok(identity) => Ok(Self(Some(AuthContext {
                user: identity.user,
                claims: identity.claims,
            }))),
            Err(Error::Unauthenticated(reason)) => {
                debug!(%reason, "ignoring unusable token on optional auth route");
                Ok(Self(None))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// `Json` whose rejection is reported in the API envelope.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(Error::validation(rejection.body_text()).into()),
        }
    }
}

/// `Path` whose rejection is reported in the API envelope.
pub struct AppPath<T>(pub T);

impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(_) => Err(Error::validation("Invalid id in request path").into()),
        }
    }
}
