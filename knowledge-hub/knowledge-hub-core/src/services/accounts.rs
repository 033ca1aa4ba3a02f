//! Registration, sessions, profiles, password reset and the per-user views.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::auth::password::{digest_reset_token, generate_reset_token, hash_password, verify_password};
use crate::auth::{Claims, Hs256Tokens, TokenVerifier};
use crate::error::{Error, Result};
use crate::models::{
    DocumentSummary, Notification, Page, PageRequest, Role, SharedDocument, User, UserId,
    UserMention, UserSummary,
};
use crate::storage::Store;
use crate::validation;

pub const DEFAULT_RESET_TTL: Duration = Duration::from_secs(60 * 60);

/// Shortest query `search_users` answers.
pub const MIN_SEARCH_LEN: usize = 2;
const SEARCH_LIMIT: u32 = 10;

/// A freshly authenticated user and their bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// A verified caller: the user row and the claims of the presented token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
    pub claims: Claims,
}

/// A reset secret to hand to the user out of band.
#[derive(Debug, Clone)]
pub struct ResetTicket {
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AccountService {
    store: Store,
    tokens: Arc<Hs256Tokens>,
    reset_ttl: Duration,
}

impl AccountService {
    pub fn new(store: Store, tokens: Arc<Hs256Tokens>, reset_ttl: Duration) -> Self {
        Self {
            store,
            tokens,
            reset_ttl,
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let name = validation::name(name)?;
        let email = validation::email(email)?;
        let password = validation::password(password)?;
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(Error::validation("Email is already registered"));
        }

        let hash = hash_password(password)?;
        let user = self.store.create_user(&name, &email, &hash, Role::User).await?;
        info!(user = user.id, "user registered");
        let token = self.tokens.issue(&user)?;
        Ok(Session { user, token })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let invalid = || Error::unauthenticated("Invalid credentials");
        let email = email.trim().to_lowercase();
        let user = self.store.find_user_by_email(&email).await?.ok_or_else(invalid)?;
        if !verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }
        let token = self.tokens.issue(&user)?;
        debug!(user = user.id, "user logged in");
        Ok(Session { user, token })
    }

    /// Verifies the token, rejects revoked ones and loads the user it names.
    pub async fn authenticate(&self, token: &str) -> Result<Identity> {
        let claims = self.tokens.verify(token).await?;
        if self.store.is_token_revoked(&claims.jti).await? {
            return Err(Error::unauthenticated("Token has been revoked"));
        }
        let user = self
            .store
            .find_user(claims.user_id()?)
            .await?
            .ok_or_else(|| Error::unauthenticated("User not found"))?;
        Ok(Identity { user, claims })
    }

    pub async fn logout(&self, claims: &Claims) -> Result<()> {
        let expires_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
        self.store.revoke_token(&claims.jti, expires_at).await?;
        debug!(sub = %claims.sub, "token revoked");
        Ok(())
    }

    pub async fn delete_account(&self, user: &User) -> Result<()> {
        if !self.store.delete_user(user.id).await? {
            return Err(Error::not_found("User not found"));
        }
        info!(user = user.id, "account deleted");
        Ok(())
    }

    /// Creates a reset secret when `email` belongs to a user. Unknown addresses
    /// yield `None` so callers can answer identically either way.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<ResetTicket>> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            debug!("password reset requested for unknown email");
            return Ok(None);
        };
        let token = generate_reset_token();
        let expires_at = chrono::Duration::from_std(self.reset_ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| Error::validation("Reset token lifetime out of range"))?;
        self.store
            .insert_password_reset(user.id, &digest_reset_token(&token), expires_at)
            .await?;
        Ok(Some(ResetTicket {
            user_id: user.id,
            token,
            expires_at,
        }))
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> Result<()> {
        let password = validation::password(password)?;
        let hash = hash_password(password)?;
        match self
            .store
            .consume_password_reset(&digest_reset_token(token.trim()), &hash)
            .await?
        {
            Some(user_id) => {
                info!(user = user_id, "password reset");
                Ok(())
            }
            None => Err(Error::validation("Invalid or expired reset token")),
        }
    }

    pub async fn update_profile(
        &self,
        user: &User,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User> {
        let name = name.map(validation::name).transpose()?;
        let email = email.map(validation::email).transpose()?;
        if name.is_none() && email.is_none() {
            return Err(Error::validation("No fields to update"));
        }
        if let Some(email) = &email {
            if self.store.email_taken_by_other(email, user.id).await? {
                return Err(Error::validation("Email is already taken"));
            }
        }
        self.store
            .update_user_profile(user.id, name.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }
        self.store.search_users(query, SEARCH_LIMIT).await
    }

    pub async fn get_user(&self, viewer: &User, id: UserId) -> Result<User> {
        self.check_self_or_admin(viewer, id)?;
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    pub async fn list_users(&self, viewer: &User) -> Result<Vec<User>> {
        Self::check_admin(viewer)?;
        self.store.list_users().await
    }

    pub async fn set_role(&self, viewer: &User, id: UserId, role: Role) -> Result<User> {
        Self::check_admin(viewer)?;
        let user = self
            .store
            .set_user_role(id, role)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;
        info!(admin = viewer.id, user = id, role = role.as_str(), "role changed");
        Ok(user)
    }

    pub async fn documents_of(
        &self,
        viewer: &User,
        id: UserId,
        page: PageRequest,
    ) -> Result<Page<DocumentSummary>> {
        self.check_self_or_admin(viewer, id)?;
        self.store.documents_by_author(id, page).await
    }

    pub async fn shared_with(
        &self,
        viewer: &User,
        id: UserId,
        page: PageRequest,
    ) -> Result<Page<SharedDocument>> {
        self.check_self_or_admin(viewer, id)?;
        self.store.documents_shared_with(id, page).await
    }

    pub async fn mentions_of(
        &self,
        viewer: &User,
        id: UserId,
        page: PageRequest,
    ) -> Result<Page<UserMention>> {
        self.check_self_or_admin(viewer, id)?;
        self.store.mentions_of(id, page).await
    }

    pub async fn notifications(&self, user: &User, page: PageRequest) -> Result<Page<Notification>> {
        self.store.notifications_for(user.id, page).await
    }

    pub async fn mark_read(&self, user: &User, notification_id: i64) -> Result<()> {
        if !self
            .store
            .mark_notification_read(notification_id, user.id)
            .await?
        {
            return Err(Error::not_found("Notification not found"));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user: &User) -> Result<u64> {
        self.store.mark_all_notifications_read(user.id).await
    }

    fn check_self_or_admin(&self, viewer: &User, id: UserId) -> Result<()> {
        if viewer.id != id && !viewer.is_admin() {
            return Err(Error::forbidden("Access denied"));
        }
        Ok(())
    }

    fn check_admin(viewer: &User) -> Result<()> {
        if !viewer.is_admin() {
            return Err(Error::forbidden("Insufficient permissions"));
        }
        Ok(())
    }
}
