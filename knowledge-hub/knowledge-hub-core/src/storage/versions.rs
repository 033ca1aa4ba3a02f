use sqlx::query_as;

use super::Store;
use crate::error::Result;
use crate::models::{DocumentId, DocumentVersion, VersionEntry};

const ENTRY_SELECT: &str = "
    SELECT v.id, v.content, v.version, v.created_at,
           v.author_id, u.name AS author_name, u.email AS author_email
    FROM document_versions v
    LEFT JOIN users u ON u.id = v.author_id";

impl Store {
    /// Version history with authors, newest first.
    pub async fn version_history(&self, document_id: DocumentId) -> Result<Vec<VersionEntry>> {
        let sql = format!("{ENTRY_SELECT} WHERE v.document_id = ?1 ORDER BY v.version DESC");
        Ok(query_as::<_, VersionEntry>(&sql)
            .bind(document_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// A single version by row id, scoped to its document.
    pub async fn find_version(
        &self,
        document_id: DocumentId,
        version_id: i64,
    ) -> Result<Option<VersionEntry>> {
        let sql = format!("{ENTRY_SELECT} WHERE v.document_id = ?1 AND v.id = ?2");
        Ok(query_as::<_, VersionEntry>(&sql)
            .bind(document_id)
            .bind(version_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Raw version rows, oldest first.
    pub async fn versions_of(&self, document_id: DocumentId) -> Result<Vec<DocumentVersion>> {
        Ok(query_as::<_, DocumentVersion>(
            "SELECT id, document_id, content, version, author_id, created_at
             FROM document_versions WHERE document_id = ?1 ORDER BY version ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
