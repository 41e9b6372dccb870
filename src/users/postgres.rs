/// Postgres-backed user store
///
/// Expects the `users` table from `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Argon2Hasher;
use crate::error::AppError;
use crate::users::model::{Credentials, UserRecord};
use crate::users::store::UserStore;

type UserRow = (Uuid, String, String, DateTime<Utc>);

pub struct PgUserStore {
    pool: PgPool,
    hasher: Argon2Hasher,
}

impl PgUserStore {
    pub fn new(pool: PgPool, hasher: Argon2Hasher) -> Self {
        Self { pool, hasher }
    }
}

fn into_record((id, email, password_hash, created_at): UserRow) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        email,
        password_hash,
        created_at,
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_record))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, AppError> {
        // Ids are issued by this store; anything else cannot match a row.
        let id = match Uuid::parse_str(id) {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };

        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_record))
    }

    async fn create(&self, credentials: &Credentials) -> Result<(), AppError> {
        let password_hash = self
            .hasher
            .hash_blocking(credentials.password.clone())
            .await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&credentials.email)
        .bind(&password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
