use super::util::is_dup_key;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_user(row: MySqlRow) -> Result<User, UserRepoError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| UserRepoError::Store(e.to_string()))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| UserRepoError::Store(e.to_string()))?;
        let password_hash: String = row
            .try_get("password")
            .map_err(|e| UserRepoError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| UserRepoError::Store(e.to_string()))?;
        let updated_at: DateTime<Utc> = row
            .try_get("updated_at")
            .map_err(|e| UserRepoError::Store(e.to_string()))?;

        Ok(User {
            id: UserId(id),
            username,
            password_hash,
            created_at,
            updated_at,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, UserRepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| UserRepoError::Store(format!("begin: {e}")))?;

        let inserted = sqlx::query(
            r#"
INSERT INTO users (username, password)
VALUES (?, ?)
"#,
        )
        .bind(username)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                UserRepoError::AlreadyExists
            } else {
                UserRepoError::Store(format!("insert user: {e}"))
            }
        })?;

        // Read generated fields back inside the same transaction.
        let row = sqlx::query(
            r#"
SELECT id, username, password, created_at, updated_at
FROM users
WHERE id = ?
"#,
        )
        .bind(inserted.last_insert_id())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| UserRepoError::Store(format!("read back user: {e}")))?
        .ok_or(UserRepoError::NotFound)?;
        let user = Self::row_to_user(row)?;

        tx.commit()
            .await
            .map_err(|e| UserRepoError::Store(format!("commit: {e}")))?;

        Ok(user)
    }

    async fn get_user_by_name(&self, username: &str) -> Result<User, UserRepoError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, username, password, created_at, updated_at
FROM users
WHERE username = ?
"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserRepoError::Store(format!("query user: {e}")))?;

        row_opt
            .map(Self::row_to_user)
            .transpose()?
            .ok_or(UserRepoError::NotFound)
    }
}
