use super::{RepoResult, StoreDirectory};
use crate::error::RepositoryError;
use crate::models::{NewStore, Store, StoreSearch};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) const STORE_COLUMNS: &str = "id, owner_id, name, description, address, latitude, \
     longitude, category, is_active, created_at, updated_at";

/// Repository for store data access
pub struct StoreRepository {
    pool: PgPool,
}

impl StoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreDirectory for StoreRepository {
    async fn create_store(&self, owner_id: Uuid, input: &NewStore) -> RepoResult<Store> {
        let sql = format!(
            r#"
            INSERT INTO stores (owner_id, name, description, address, latitude, longitude, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {STORE_COLUMNS}
            "#
        );

        let store = sqlx::query_as::<_, Store>(&sql)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.address)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(&input.category)
            .fetch_one(&self.pool)
            .await?;

        Ok(store)
    }

    async fn find_store_by_id(&self, id: Uuid) -> RepoResult<Option<Store>> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = $1");
        let store = sqlx::query_as::<_, Store>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(store)
    }

    async fn find_stores_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<Store>> {
        let sql = format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE owner_id = $1 ORDER BY created_at DESC"
        );
        let stores = sqlx::query_as::<_, Store>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(stores)
    }

    async fn set_store_active(&self, id: Uuid, active: bool) -> RepoResult<Store> {
        let sql = format!(
            r#"
            UPDATE stores
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Store>(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Store not found".to_string()))
    }

    async fn store_search_candidates(&self, search: &StoreSearch) -> RepoResult<Vec<Store>> {
        let sql = format!(
            r#"
            SELECT {STORE_COLUMNS}
            FROM stores
            WHERE is_active = TRUE
              AND ($1::TEXT IS NULL OR category = $1)
              AND ($2::TEXT IS NULL OR strpos(lower(name), lower($2)) > 0)
            "#
        );

        let stores = sqlx::query_as::<_, Store>(&sql)
            .bind(search.category_filter())
            .bind(search.query_filter())
            .fetch_all(&self.pool)
            .await?;

        Ok(stores)
    }
}
