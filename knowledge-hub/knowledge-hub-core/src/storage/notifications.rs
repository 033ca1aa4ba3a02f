use sqlx::types::Json;
use sqlx::{query, query_as, query_scalar, SqliteConnection};

use super::{now, Store};
use crate::error::Result;
use crate::models::{Notification, NotificationKind, Page, PageRequest, UserId};

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

pub(crate) async fn insert_notification(
    conn: &mut SqliteConnection,
    user_id: UserId,
    notification: &NewNotification,
) -> Result<i64> {
    let id = query(
        "INSERT INTO notifications (user_id, type, title, message, data, is_read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
    )
    .bind(user_id)
    .bind(notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.data.as_ref().map(Json))
    .bind(now())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

impl Store {
    pub async fn notifications_for(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Notification>> {
        let items = query_as::<_, Notification>(
            "SELECT id, user_id, type, title, message, data, is_read, created_at
             FROM notifications WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3",
        )
        .bind(user_id)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(page.into_page(items, total))
    }

    /// `false` when the notification does not exist or belongs to someone else.
    pub async fn mark_notification_read(&self, id: i64, user_id: UserId) -> Result<bool> {
        let result = query("UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_notifications_read(&self, user_id: UserId) -> Result<u64> {
        let result = query("UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
