use super::listing_repository::{decrement_locked, lock_for_reservation};
use super::{OrderStore, RepoResult};
use crate::error::RepositoryError;
use crate::models::{NewOrder, Order, OrderStatus};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, listing_id, store_id, quantity, total_price, status, \
     pickup_code, notes, picked_up_at, created_at, updated_at";

/// Repository for order data access
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn place_order(&self, order: &NewOrder) -> RepoResult<Order> {
        if order.quantity <= 0 {
            return Err(RepositoryError::ConstraintViolation(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        // The listing row stays locked until commit, so the stock check,
        // the insert and the decrement act as one step.
        let listing = lock_for_reservation(&mut *tx, order.listing_id, order.quantity).await?;
        let total_price = listing.price_for(order.quantity).ok_or_else(|| {
            RepositoryError::ConstraintViolation("Order total is out of range".to_string())
        })?;

        let sql = format!(
            r#"
            INSERT INTO orders
                (user_id, listing_id, store_id, quantity, total_price, status, pickup_code, notes)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7)
            ON CONFLICT (pickup_code) WHERE status IN ('pending', 'confirmed', 'ready')
            DO NOTHING
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(order.user_id)
            .bind(listing.id)
            .bind(listing.store_id)
            .bind(order.quantity)
            .bind(total_price)
            .bind(&order.pickup_code)
            .bind(&order.notes)
            .fetch_optional(&mut *tx)
            .await?;

        // Dropping `tx` rolls back, releasing the row lock untouched
        let created = created.ok_or_else(|| {
            RepositoryError::Duplicate(format!("Pickup code {} is in use", order.pickup_code))
        })?;

        decrement_locked(&mut *tx, listing.id, order.quantity).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn find_order_by_id(&self, id: Uuid) -> RepoResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    async fn find_orders_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    async fn find_orders_by_store(&self, store_id: Uuid) -> RepoResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE store_id = $1 ORDER BY created_at DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> RepoResult<Order> {
        let sql = format!(
            r#"
            UPDATE orders
            SET status = $3::TEXT,
                picked_up_at = CASE WHEN $3::TEXT = 'completed' THEN NOW() ELSE picked_up_at END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(order) => Ok(order),
            None => match self.find_order_by_id(id).await? {
                Some(current) => Err(RepositoryError::Stale(format!(
                    "Order is {}, expected {}",
                    current.status, from
                ))),
                None => Err(RepositoryError::NotFound("Order not found".to_string())),
            },
        }
    }

    async fn redeem_pickup_code(&self, code: &str) -> RepoResult<Option<Order>> {
        let sql = format!(
            r#"
            UPDATE orders
            SET status = 'completed', picked_up_at = NOW(), updated_at = NOW()
            WHERE pickup_code = $1 AND status IN ('pending', 'confirmed', 'ready')
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }
}
