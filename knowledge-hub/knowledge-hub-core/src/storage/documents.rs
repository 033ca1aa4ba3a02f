use sqlx::{query, query_as, query_scalar, SqliteConnection};

use super::mentions::insert_mentions;
use super::{like_pattern, now, Store};
use crate::error::{Error, Result};
use crate::models::{
    Document, DocumentId, DocumentSummary, Page, PageRequest, SharedDocument, UserId,
};

const SUMMARY_SELECT: &str = "
    SELECT d.id, d.title, d.content, d.is_public, d.author_id,
           u.name AS author_name, u.email AS author_email,
           d.created_at, d.updated_at
    FROM documents d
    JOIN users u ON u.id = d.author_id";

/// Visible to `?1`: public, authored by `?1`, or shared with `?1`. A NULL
/// requester only sees public documents.
const VISIBLE_TO: &str = "
    (d.is_public = 1 OR (?1 IS NOT NULL AND (
        d.author_id = ?1
        OR EXISTS (SELECT 1 FROM document_shares s WHERE s.document_id = d.id AND s.user_id = ?1)
    )))";

/// Title or content contains `?2`, or no search given.
const MATCHES_SEARCH: &str = "
    (?2 IS NULL OR d.title LIKE ?2 ESCAPE '\\' OR d.content LIKE ?2 ESCAPE '\\')";

/// Title hits rank above content-only hits.
const RELEVANCE: &str = "
    CASE WHEN ?2 IS NULL THEN 0 WHEN d.title LIKE ?2 ESCAPE '\\' THEN 2 ELSE 1 END";

/// Fields of a partial document update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_public: Option<bool>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.is_public.is_none()
    }
}

async fn fetch_document(conn: &mut SqliteConnection, id: DocumentId) -> Result<Option<Document>> {
    Ok(query_as::<_, Document>(
        "SELECT id, title, content, is_public, author_id, created_at, updated_at
         FROM documents WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?)
}

impl Store {
    /// Inserts a document together with its first version and any mentions.
    /// Nothing is written unless all of it is.
    pub async fn create_document(
        &self,
        author_id: UserId,
        title: &str,
        content: &str,
        is_public: bool,
        mentions: &[UserId],
    ) -> Result<Document> {
        let at = now();
        let mut tx = self.pool.begin().await?;

        let id = query(
            "INSERT INTO documents (title, content, is_public, author_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        )
        .bind(title)
        .bind(content)
        .bind(is_public)
        .bind(author_id)
        .bind(&at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        query(
            "INSERT INTO document_versions (document_id, content, version, author_id, created_at)
             VALUES (?1, ?2, 1, ?3, ?4)",
        )
        .bind(id)
        .bind(content)
        .bind(author_id)
        .bind(&at)
        .execute(&mut *tx)
        .await?;

        insert_mentions(&mut tx, id, mentions, author_id).await?;

        let document = fetch_document(&mut tx, id)
            .await?
            .ok_or_else(|| Error::not_found("Document not found"))?;
        tx.commit().await?;
        Ok(document)
    }

    pub async fn find_document(&self, id: DocumentId) -> Result<Option<Document>> {
        let mut conn = self.pool.acquire().await?;
        fetch_document(&mut conn, id).await
    }

    /// Applies `patch`, refreshes `updated_at` and, when content is supplied,
    /// appends the next version. Returns `None` if the document is gone.
    ///
    /// `editor_id` must be the author or hold an EDIT share when the row is
    /// written; a grant revoked after the caller's access check is refused
    /// here with [`Error::Forbidden`].
    ///
    /// The document row is written before the version number is read, so the
    /// transaction already holds the database write lock when it computes
    /// `MAX(version) + 1`. Concurrent editors of the same document therefore
    /// queue behind each other instead of racing for the same number; the
    /// unique `(document_id, version)` index backs this up.
    pub async fn update_document(
        &self,
        id: DocumentId,
        editor_id: UserId,
        patch: &DocumentPatch,
        mentions: &[UserId],
    ) -> Result<Option<(Document, Option<i64>)>> {
        let at = now();
        let mut tx = self.pool.begin().await?;

        let updated = query(
            "UPDATE documents
             SET title = COALESCE(?1, title),
                 content = COALESCE(?2, content),
                 is_public = COALESCE(?3, is_public),
                 updated_at = ?4
             WHERE id = ?5 AND (
                 author_id = ?6
                 OR EXISTS (SELECT 1 FROM document_shares s
                            WHERE s.document_id = ?5 AND s.user_id = ?6 AND s.permission = 'EDIT')
             )",
        )
        .bind(patch.title.as_deref())
        .bind(patch.content.as_deref())
        .bind(patch.is_public)
        .bind(&at)
        .bind(id)
        .bind(editor_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return match fetch_document(&mut tx, id).await? {
                Some(_) => Err(Error::forbidden(
                    "You do not have permission to edit this document",
                )),
                None => Ok(None),
            };
        }

        let version = match patch.content.as_deref() {
            Some(content) => {
                let next: i64 = query_scalar(
                    "INSERT INTO document_versions (document_id, content, version, author_id, created_at)
                     SELECT ?1, ?2, COALESCE(MAX(version), 0) + 1, ?3, ?4
                     FROM document_versions WHERE document_id = ?1
                     RETURNING version",
                )
                .bind(id)
                .bind(content)
                .bind(editor_id)
                .bind(&at)
                .fetch_one(&mut *tx)
                .await?;
                Some(next)
            }
            None => None,
        };

        insert_mentions(&mut tx, id, mentions, editor_id).await?;

        let document = fetch_document(&mut tx, id)
            .await?
            .ok_or_else(|| Error::not_found("Document not found"))?;
        tx.commit().await?;
        Ok(Some((document, version)))
    }

    /// Shares, versions and mentions go with it through foreign-key cascades.
    pub async fn delete_document(&self, id: DocumentId) -> Result<bool> {
        let result = query("DELETE FROM documents WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Visibility-scoped, optionally searched listing.
    pub async fn list_documents(
        &self,
        requester: Option<UserId>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<DocumentSummary>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let sql = format!(
            "{SUMMARY_SELECT}
             WHERE {VISIBLE_TO} AND {MATCHES_SEARCH}
             ORDER BY {RELEVANCE} DESC, d.updated_at DESC, d.id DESC
             LIMIT ?3 OFFSET ?4"
        );
        let items = query_as::<_, DocumentSummary>(&sql)
            .bind(requester)
            .bind(pattern.as_deref())
            .bind(i64::from(page.limit))
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let count_sql =
            format!("SELECT COUNT(*) FROM documents d WHERE {VISIBLE_TO} AND {MATCHES_SEARCH}");
        let total: i64 = query_scalar(&count_sql)
            .bind(requester)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok(page.into_page(items, total))
    }

    pub async fn documents_by_author(
        &self,
        author_id: UserId,
        page: PageRequest,
    ) -> Result<Page<DocumentSummary>> {
        let sql = format!(
            "{SUMMARY_SELECT}
             WHERE d.author_id = ?1
             ORDER BY d.updated_at DESC, d.id DESC
             LIMIT ?2 OFFSET ?3"
        );
        let items = query_as::<_, DocumentSummary>(&sql)
            .bind(author_id)
            .bind(i64::from(page.limit))
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = query_scalar("SELECT COUNT(*) FROM documents WHERE author_id = ?1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(page.into_page(items, total))
    }

    pub async fn documents_shared_with(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<SharedDocument>> {
        let items = query_as::<_, SharedDocument>(
            "SELECT d.id, d.title, d.content, d.is_public, d.author_id,
                    u.name AS author_name, u.email AS author_email,
                    d.created_at, d.updated_at,
                    s.permission, s.created_at AS shared_at
             FROM document_shares s
             JOIN documents d ON d.id = s.document_id
             JOIN users u ON u.id = d.author_id
             WHERE s.user_id = ?1
             ORDER BY s.created_at DESC, s.id DESC
             LIMIT ?2 OFFSET ?3",
        )
        .bind(user_id)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = query_scalar("SELECT COUNT(*) FROM document_shares WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(page.into_page(items, total))
    }
}
