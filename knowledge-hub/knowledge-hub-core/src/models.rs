//! Row types for the relational schema and the joined views the API returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type UserId = i64;
pub type DocumentId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(Error::validation("Role must be USER or ADMIN")),
        }
    }
}

/// Granularity of a share grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Permission {
    View,
    Edit,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::View => "VIEW",
            Permission::Edit => "EDIT",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VIEW" => Ok(Permission::View),
            "EDIT" => Ok(Permission::Edit),
            _ => Err(Error::validation("Permission must be VIEW or EDIT")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    Mention,
    Share,
    Update,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Public projection used by user search and author blocks.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A document joined with its author, as returned by listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub author_id: UserId,
    pub author_name: String,
    pub author_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A document shared with a user, with the grant that makes it visible.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SharedDocument {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub author_id: UserId,
    pub author_name: String,
    pub author_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub permission: Permission,
    pub shared_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentShare {
    pub id: i64,
    pub document_id: DocumentId,
    pub user_id: UserId,
    pub permission: Permission,
    pub created_at: DateTime<Utc>,
}

/// Share row joined with the grantee.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShareGrant {
    pub id: i64,
    pub permission: Permission,
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentVersion {
    pub id: i64,
    pub document_id: DocumentId,
    pub content: String,
    pub version: i64,
    /// `None` once the writer's account is deleted.
    pub author_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Version row joined with the user who wrote it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VersionEntry {
    pub id: i64,
    pub content: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub author_id: Option<UserId>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

/// Mention as shown on a document page.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentMention {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub mentioned_by_id: UserId,
    pub mentioned_by_name: String,
}

/// Mention as shown in a user's inbox.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserMention {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub document_id: DocumentId,
    pub document_title: String,
    pub mentioned_by_id: UserId,
    pub mentioned_by_name: String,
    pub mentioned_by_email: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: UserId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: Option<Json<serde_json::Value>>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of an offset-paginated listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.limit == 0 {
            return 0;
        }
        (self.total + i64::from(self.limit) - 1) / i64::from(self.limit)
    }
}

/// Offset pagination request, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const MAX_LIMIT: u32 = 50;

    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Lenient parsing: anything unparsable falls back to the defaults.
    pub fn parse(page: Option<&str>, limit: Option<&str>, default_limit: u32) -> Self {
        let page = page.and_then(|p| p.trim().parse::<u32>().ok()).unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<u32>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(default_limit);
        Self::new(page, limit)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn into_page<T>(self, items: Vec<T>, total: i64) -> Page<T> {
        Page {
            items,
            page: self.page,
            limit: self.limit,
            total,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps_bounds() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(3, 500), PageRequest { page: 3, limit: 50 });
        assert_eq!(PageRequest::new(2, 10).offset(), 10);
    }

    #[test]
    fn page_request_parse_falls_back_on_garbage() {
        let req = PageRequest::parse(Some("abc"), Some("-4"), 10);
        assert_eq!(req, PageRequest { page: 1, limit: 10 });
        let req = PageRequest::parse(Some("2"), Some("0"), 20);
        assert_eq!(req, PageRequest { page: 2, limit: 20 });
        let req = PageRequest::parse(None, Some("75"), 10);
        assert_eq!(req.limit, 50);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PageRequest::new(1, 10).into_page(Vec::<()>::new(), 21);
        assert_eq!(page.total_pages(), 3);
        let empty = PageRequest::new(1, 10).into_page(Vec::<()>::new(), 0);
        assert_eq!(empty.total_pages(), 0);
    }

    #[test]
    fn permission_parses_uppercase_only() {
        assert_eq!("EDIT".parse::<Permission>().unwrap(), Permission::Edit);
        assert!("edit".parse::<Permission>().is_err());
        assert!("OWNER".parse::<Permission>().is_err());
    }
}
