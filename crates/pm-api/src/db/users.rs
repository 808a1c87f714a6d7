//! Login users on the `users` table.

use async_trait::async_trait;
use pm_auth::{AuthError, UserRecord, UserStore};
use pm_core::Email;
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed user store.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Wrap a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user, or replace the hash and role of an existing one.
    pub async fn upsert(&self, record: &UserRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO UPDATE
             SET password_hash = EXCLUDED.password_hash, role = EXCLUDED.role",
        )
        .bind(record.id)
        .bind(record.email.as_str())
        .bind(&record.password_hash)
        .bind(&record.role)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: String,
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, role FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::UserStore(e.to_string()))?;

        row.map(|row| {
            let email = Email::new(row.email)
                .map_err(|e| AuthError::UserStore(format!("corrupt user {}: {e}", row.id)))?;
            Ok(UserRecord {
                id: row.id,
                email,
                password_hash: row.password_hash,
                role: row.role,
            })
        })
        .transpose()
    }
}
