use sqlx::{query, query_as, query_scalar, SqliteConnection};

use super::{is_unique_violation, like_pattern, now, Store};
use crate::error::{Error, Result};
use crate::models::{Role, User, UserId, UserSummary};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// Replaces a password hash on `conn`, so it commits with the caller's
/// transaction.
pub(super) async fn write_password_hash(
    conn: &mut SqliteConnection,
    id: UserId,
    password_hash: &str,
    at: &str,
) -> Result<bool> {
    let result = query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(password_hash)
        .bind(at)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

impl Store {
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User> {
        let at = now();
        let result = query(
            "INSERT INTO users (name, email, password_hash, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(&at)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                Error::validation("Email is already registered")
            } else {
                Error::from(err)
            }
        })?;

        self.find_user(result.last_insert_rowid())
            .await?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    pub async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        Ok(query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Case-insensitive lookup; the column is declared `COLLATE NOCASE`.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        Ok(query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn email_taken_by_other(&self, email: &str, user_id: UserId) -> Result<bool> {
        let taken: bool =
            query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = ?1 AND id != ?2)")
                .bind(email)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    /// Ids from `ids` that do not belong to any user.
    pub async fn missing_users(&self, ids: &[UserId]) -> Result<Vec<UserId>> {
        let mut missing = Vec::new();
        for &id in ids {
            let exists: bool = query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = ?1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            if !exists {
                missing.push(id);
            }
        }
        Ok(missing)
    }

    /// Only the supplied fields change.
    pub async fn update_user_profile(
        &self,
        id: UserId,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>> {
        let result = query(
            "UPDATE users
             SET name = COALESCE(?1, name), email = COALESCE(?2, email), updated_at = ?3
             WHERE id = ?4",
        )
        .bind(name)
        .bind(email)
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                Error::validation("Email is already taken")
            } else {
                Error::from(err)
            }
        })?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_user(id).await
    }

    pub async fn set_user_role(&self, id: UserId, role: Role) -> Result<Option<User>> {
        let result = query("UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(role)
            .bind(now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_user(id).await
    }

    /// Removes the user; their documents, shares, mentions and notifications
    /// follow through foreign-key cascades. Versions they wrote on other
    /// users' documents stay, with the author cleared.
    pub async fn delete_user(&self, id: UserId) -> Result<bool> {
        let result = query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        Ok(query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn search_users(&self, term: &str, limit: u32) -> Result<Vec<UserSummary>> {
        Ok(query_as::<_, UserSummary>(
            "SELECT id, name, email FROM users
             WHERE name LIKE ?1 ESCAPE '\\' OR email LIKE ?1 ESCAPE '\\'
             ORDER BY name ASC, id ASC
             LIMIT ?2",
        )
        .bind(like_pattern(term))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?)
    }
}
