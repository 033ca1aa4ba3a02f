use chrono::{DateTime, Utc};
use sqlx::{query, query_scalar};

use super::users::write_password_hash;
use super::{now, timestamp, Store};
use crate::error::Result;
use crate::models::UserId;

impl Store {
    /// Stores the digest of a reset secret. Earlier unused secrets for the
    /// same user are invalidated.
    pub async fn insert_password_reset(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        query("UPDATE password_resets SET used_at = ?1 WHERE user_id = ?2 AND used_at IS NULL")
            .bind(now())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        query(
            "INSERT INTO password_resets (user_id, token_hash, expires_at)
             VALUES (?1, ?2, ?3)",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(timestamp(expires_at))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Marks a live reset secret used and sets the new password hash, both or
    /// neither. `None` when the secret is unknown, spent or expired.
    pub async fn consume_password_reset(
        &self,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<UserId>> {
        let at = now();
        let mut tx = self.pool.begin().await?;

        let user_id: Option<UserId> = query_scalar(
            "UPDATE password_resets SET used_at = ?1
             WHERE token_hash = ?2 AND used_at IS NULL AND expires_at > ?1
             RETURNING user_id",
        )
        .bind(&at)
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(user_id) = user_id else {
            return Ok(None);
        };

        if !write_password_hash(&mut tx, user_id, new_password_hash, &at).await? {
            return Ok(None);
        }
        tx.commit().await?;
        Ok(Some(user_id))
    }

    /// Remembers `jti` until the token would have expired anyway. Entries
    /// past their expiry are swept on the way.
    pub async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<()> {
        query("DELETE FROM revoked_tokens WHERE expires_at <= ?1")
            .bind(now())
            .execute(&self.pool)
            .await?;
        query("INSERT OR IGNORE INTO revoked_tokens (jti, expires_at) VALUES (?1, ?2)")
            .bind(jti)
            .bind(timestamp(expires_at))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn is_token_revoked(&self, jti: &str) -> Result<bool> {
        let revoked: bool =
            query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = ?1)")
                .bind(jti)
                .fetch_one(&self.pool)
                .await?;
        Ok(revoked)
    }
}
