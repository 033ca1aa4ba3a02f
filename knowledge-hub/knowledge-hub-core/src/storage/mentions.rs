use sqlx::{query, query_as, query_scalar, SqliteConnection};

use super::{now, Store};
use crate::error::Result;
use crate::models::{DocumentId, DocumentMention, Page, PageRequest, UserId, UserMention};

/// Records `users` as mentioned in the document. A user already mentioned
/// there keeps the original row; unknown users fail the foreign key.
pub(super) async fn insert_mentions(
    conn: &mut SqliteConnection,
    document_id: DocumentId,
    users: &[UserId],
    mentioned_by: UserId,
) -> Result<()> {
    let at = now();
    for &user_id in users {
        query(
            "INSERT INTO mentions (document_id, user_id, mentioned_by, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (document_id, user_id) DO NOTHING",
        )
        .bind(document_id)
        .bind(user_id)
        .bind(mentioned_by)
        .bind(&at)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

impl Store {
    pub async fn document_mentions(&self, document_id: DocumentId) -> Result<Vec<DocumentMention>> {
        Ok(query_as::<_, DocumentMention>(
            "SELECT m.id, m.created_at,
                    u.id AS user_id, u.name AS user_name, u.email AS user_email,
                    b.id AS mentioned_by_id, b.name AS mentioned_by_name
             FROM mentions m
             JOIN users u ON u.id = m.user_id
             JOIN users b ON b.id = m.mentioned_by
             WHERE m.document_id = ?1
             ORDER BY m.created_at ASC, m.id ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Mentions of `user_id` across all documents, newest first.
    pub async fn mentions_of(&self, user_id: UserId, page: PageRequest) -> Result<Page<UserMention>> {
        let items = query_as::<_, UserMention>(
            "SELECT m.id, m.created_at,
                    d.id AS document_id, d.title AS document_title,
                    b.id AS mentioned_by_id, b.name AS mentioned_by_name,
                    b.email AS mentioned_by_email
             FROM mentions m
             JOIN documents d ON d.id = m.document_id
             JOIN users b ON b.id = m.mentioned_by
             WHERE m.user_id = ?1
             ORDER BY m.created_at DESC, m.id DESC
             LIMIT ?2 OFFSET ?3",
        )
        .bind(user_id)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = query_scalar("SELECT COUNT(*) FROM mentions WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(page.into_page(items, total))
    }
}
