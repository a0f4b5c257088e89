use super::{RepoResult, UserStore};
use crate::error::RepositoryError;
use crate::models::{User, UserType};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for user data access
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(&self, email: &str, name: &str, user_type: UserType) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, user_type)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, user_type, created_at
            "#,
        )
        .bind(email.trim().to_lowercase())
        .bind(name)
        .bind(user_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, user_type, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, user_type, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_user_type(&self, id: Uuid, user_type: UserType) -> RepoResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET user_type = $2
            WHERE id = $1
            RETURNING id, email, name, user_type, created_at
            "#,
        )
        .bind(id)
        .bind(user_type.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("User not found".to_string()))
    }
}
