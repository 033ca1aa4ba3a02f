use sqlx::{query, query_as};

use super::notifications::{insert_notification, NewNotification};
use super::{now, Store};
use crate::error::{Error, Result};
use crate::models::{DocumentId, DocumentShare, Permission, ShareGrant, UserId};

impl Store {
    pub async fn find_share(
        &self,
        document_id: DocumentId,
        user_id: UserId,
    ) -> Result<Option<DocumentShare>> {
        Ok(query_as::<_, DocumentShare>(
            "SELECT id, document_id, user_id, permission, created_at
             FROM document_shares WHERE document_id = ?1 AND user_id = ?2",
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Grants or replaces `user_id`'s permission on the document, and records
    /// the notification (if any) in the same transaction.
    pub async fn upsert_share(
        &self,
        document_id: DocumentId,
        user_id: UserId,
        permission: Permission,
        notification: Option<&NewNotification>,
    ) -> Result<DocumentShare> {
        let mut tx = self.pool.begin().await?;

        let share = query_as::<_, DocumentShare>(
            "INSERT INTO document_shares (document_id, user_id, permission, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (document_id, user_id) DO UPDATE SET permission = excluded.permission
             RETURNING id, document_id, user_id, permission, created_at",
        )
        .bind(document_id)
        .bind(user_id)
        .bind(permission)
        .bind(now())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found("Document not found"))?;

        if let Some(notification) = notification {
            insert_notification(&mut tx, user_id, notification).await?;
        }

        tx.commit().await?;
        Ok(share)
    }

    /// Returns whether a row was removed.
    pub async fn delete_share(&self, document_id: DocumentId, user_id: UserId) -> Result<bool> {
        let result = query("DELETE FROM document_shares WHERE document_id = ?1 AND user_id = ?2")
            .bind(document_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn share_grants(&self, document_id: DocumentId) -> Result<Vec<ShareGrant>> {
        Ok(query_as::<_, ShareGrant>(
            "SELECT s.id, s.permission, s.created_at,
                    u.id AS user_id, u.name AS user_name, u.email AS user_email
             FROM document_shares s
             JOIN users u ON u.id = s.user_id
             WHERE s.document_id = ?1
             ORDER BY s.created_at ASC, s.id ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
