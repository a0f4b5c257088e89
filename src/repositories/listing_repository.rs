use super::store_repository::STORE_COLUMNS;
use super::{ListingStore, RepoResult};
use crate::error::RepositoryError;
use crate::models::{Listing, ListingSearch, NewListing, Store};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

pub(crate) const LISTING_COLUMNS: &str = "id, store_id, title, description, original_price, \
     discounted_price, quantity_total, quantity_left, pickup_start, pickup_end, category, \
     is_active, created_at, updated_at";

/// Repository for listing (food bag) data access
pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lock the listing row and check it can supply `quantity` bags.
///
/// Must run inside a transaction; the row stays locked until it ends, which
/// serialises every reservation against the same listing.
pub(crate) async fn lock_for_reservation(
    conn: &mut PgConnection,
    listing_id: Uuid,
    quantity: i32,
) -> RepoResult<Listing> {
    let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1 FOR UPDATE");
    let listing = sqlx::query_as::<_, Listing>(&sql)
        .bind(listing_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("Listing not found".to_string()))?;

    let store_active: bool = sqlx::query_scalar("SELECT is_active FROM stores WHERE id = $1")
        .bind(listing.store_id)
        .fetch_optional(&mut *conn)
        .await?
        .unwrap_or(false);

    if !listing.is_active || !store_active {
        return Err(RepositoryError::Inactive(
            "Listing is no longer available".to_string(),
        ));
    }

    if quantity > listing.quantity_left {
        return Err(RepositoryError::InsufficientStock {
            requested: quantity,
            available: listing.quantity_left,
        });
    }

    Ok(listing)
}

/// Subtract `quantity` from a listing previously locked with [`lock_for_reservation`]
pub(crate) async fn decrement_locked(
    conn: &mut PgConnection,
    listing_id: Uuid,
    quantity: i32,
) -> RepoResult<Listing> {
    let sql = format!(
        r#"
        UPDATE listings
        SET quantity_left = quantity_left - $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {LISTING_COLUMNS}
        "#
    );

    let listing = sqlx::query_as::<_, Listing>(&sql)
        .bind(listing_id)
        .bind(quantity)
        .fetch_one(&mut *conn)
        .await?;

    Ok(listing)
}

#[async_trait]
impl ListingStore for ListingRepository {
    async fn create_listing(&self, input: &NewListing) -> RepoResult<Listing> {
        let sql = format!(
            r#"
            INSERT INTO listings
                (store_id, title, description, original_price, discounted_price,
                 quantity_total, quantity_left, pickup_start, pickup_end, category)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8, $9)
            RETURNING {LISTING_COLUMNS}
            "#
        );

        let listing = sqlx::query_as::<_, Listing>(&sql)
            .bind(input.store_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.original_price)
            .bind(input.discounted_price)
            .bind(input.quantity_total)
            .bind(input.pickup_start)
            .bind(input.pickup_end)
            .bind(&input.category)
            .fetch_one(&self.pool)
            .await?;

        Ok(listing)
    }

    async fn find_listing_by_id(&self, id: Uuid) -> RepoResult<Option<Listing>> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1");
        let listing = sqlx::query_as::<_, Listing>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(listing)
    }

    async fn find_active_listings_by_store(&self, store_id: Uuid) -> RepoResult<Vec<Listing>> {
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM listings
            WHERE store_id = $1 AND is_active = TRUE
            ORDER BY pickup_start ASC
            "#
        );

        let listings = sqlx::query_as::<_, Listing>(&sql)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(listings)
    }

    async fn update_listing(&self, listing: &Listing) -> RepoResult<Listing> {
        let sql = format!(
            r#"
            UPDATE listings
            SET title = $2,
                description = $3,
                original_price = $4,
                discounted_price = $5,
                pickup_start = $6,
                pickup_end = $7,
                category = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Listing>(&sql)
            .bind(listing.id)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(listing.original_price)
            .bind(listing.discounted_price)
            .bind(listing.pickup_start)
            .bind(listing.pickup_end)
            .bind(&listing.category)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Listing not found".to_string()))
    }

    async fn set_listing_active(&self, id: Uuid, active: bool) -> RepoResult<Listing> {
        let sql = format!(
            r#"
            UPDATE listings
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Listing>(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Listing not found".to_string()))
    }

    async fn reserve(&self, listing_id: Uuid, quantity: i32) -> RepoResult<Listing> {
        if quantity <= 0 {
            return Err(RepositoryError::ConstraintViolation(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        lock_for_reservation(&mut *tx, listing_id, quantity).await?;
        let listing = decrement_locked(&mut *tx, listing_id, quantity).await?;
        tx.commit().await?;

        Ok(listing)
    }

    async fn listing_search_candidates(
        &self,
        search: &ListingSearch,
    ) -> RepoResult<Vec<(Listing, Store)>> {
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM listings
            WHERE is_active = TRUE
              AND quantity_left > 0
              AND ($1::TEXT IS NULL OR category = $1)
              AND ($2::NUMERIC IS NULL OR discounted_price >= $2)
              AND ($3::NUMERIC IS NULL OR discounted_price <= $3)
            "#
        );

        let listings = sqlx::query_as::<_, Listing>(&sql)
            .bind(search.category_filter())
            .bind(search.min_price_filter())
            .bind(search.max_price_filter())
            .fetch_all(&self.pool)
            .await?;

        if listings.is_empty() {
            return Ok(Vec::new());
        }

        let mut store_ids: Vec<Uuid> = listings.iter().map(|l| l.store_id).collect();
        store_ids.sort();
        store_ids.dedup();

        let sql = format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = ANY($1) AND is_active = TRUE"
        );
        let stores: HashMap<Uuid, Store> = sqlx::query_as::<_, Store>(&sql)
            .bind(&store_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(listings
            .into_iter()
            .filter_map(|listing| {
                let store = stores.get(&listing.store_id)?.clone();
                Some((listing, store))
            })
            .collect())
    }
}
