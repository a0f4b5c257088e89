use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::{NewOrder, Order, OrderStatus, Store};
use crate::repositories::{OrderStore, StoreDirectory};
use crate::services::pickup_code::{normalize_pickup_code, PickupCodeGenerator};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Attempts at drawing a pickup code not held by another open order
pub const MAX_PICKUP_CODE_ATTEMPTS: usize = 8;

/// Service for placing orders and moving them through fulfilment
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    stores: Arc<dyn StoreDirectory>,
    codes: Arc<dyn PickupCodeGenerator>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        stores: Arc<dyn StoreDirectory>,
        codes: Arc<dyn PickupCodeGenerator>,
    ) -> Self {
        Self {
            orders,
            stores,
            codes,
        }
    }

    /// Place an order and reserve its bags.
    ///
    /// The listing checks, the order insert and the stock decrement happen in
    /// one storage-level step, so a failure leaves no trace.
    pub async fn place_order(
        &self,
        buyer_id: Uuid,
        listing_id: Uuid,
        quantity: i32,
        notes: Option<String>,
    ) -> AppResult<Order> {
        if quantity <= 0 {
            return Err(AppError::Validation(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        for attempt in 1..=MAX_PICKUP_CODE_ATTEMPTS {
            let new_order = NewOrder {
                user_id: buyer_id,
                listing_id,
                quantity,
                notes: notes.clone(),
                pickup_code: self.codes.generate(),
            };

            match self.orders.place_order(&new_order).await {
                Ok(order) => {
                    info!(
                        "Order placed: order={}, listing={}, buyer={}, quantity={}, total={}",
                        order.id, listing_id, buyer_id, quantity, order.total_price
                    );
                    return Ok(order);
                }
                Err(RepositoryError::Duplicate(_)) => {
                    warn!(
                        "Pickup code collision on listing {} (attempt {}/{})",
                        listing_id, attempt, MAX_PICKUP_CODE_ATTEMPTS
                    );
                }
                Err(e) => {
                    warn!("Order rejected for listing {}: {}", listing_id, e);
                    return Err(e.into());
                }
            }
        }

        Err(AppError::Conflict(
            "Could not allocate a unique pickup code, please retry".to_string(),
        ))
    }

    pub async fn get_order(&self, order_id: Uuid) -> AppResult<Order> {
        self.orders
            .find_order_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }

    /// Orders placed by `user_id`, newest first
    pub async fn list_orders_by_user(&self, user_id: Uuid) -> AppResult<Vec<Order>> {
        Ok(self.orders.find_orders_by_user(user_id).await?)
    }

    /// Orders against any listing of `store_id`, newest first
    pub async fn list_orders_by_store(&self, store_id: Uuid) -> AppResult<Vec<Order>> {
        Ok(self.orders.find_orders_by_store(store_id).await?)
    }

    /// Move an order to `status`.
    ///
    /// Unknown names, moves out of a terminal state, and backward or
    /// same-state moves are `InvalidTransition`. A concurrent change between
    /// the read and the write surfaces as `Conflict`.
    pub async fn update_order_status(&self, order_id: Uuid, status: &str) -> AppResult<Order> {
        let target = OrderStatus::from_str(status).map_err(AppError::InvalidTransition)?;
        let current = self.get_order(order_id).await?;
        let from = current.status_enum();

        if !from.can_transition_to(target) {
            return Err(AppError::InvalidTransition(format!(
                "Cannot move order from {} to {}",
                from, target
            )));
        }

        let order = self
            .orders
            .transition_status(order_id, from, target)
            .await?;

        info!("Order {} status changed: {} -> {}", order_id, from, target);
        Ok(order)
    }

    /// Redeem a pickup code, completing the open order that holds it
    pub async fn verify_pickup_code(&self, code: &str) -> AppResult<Order> {
        let code = normalize_pickup_code(code)
            .ok_or_else(|| AppError::NotFound("Invalid pickup code".to_string()))?;

        let order = self
            .orders
            .redeem_pickup_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid pickup code".to_string()))?;

        info!("Pickup verified: order={}, store={}", order.id, order.store_id);
        Ok(order)
    }

    /// Load a store and check `user_id` owns it
    pub async fn ensure_store_owner(&self, store_id: Uuid, user_id: Uuid) -> AppResult<Store> {
        let store = self
            .stores
            .find_store_by_id(store_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

        if !store.is_owned_by(user_id) {
            return Err(AppError::Forbidden(
                "You do not own this store".to_string(),
            ));
        }

        Ok(store)
    }

    /// Buyers see their own orders; store owners see orders placed with them
    pub async fn ensure_order_visible_to(&self, order: &Order, user_id: Uuid) -> AppResult<()> {
        if order.user_id == user_id {
            return Ok(());
        }
        match self.ensure_store_owner(order.store_id, user_id).await {
            Ok(_) => Ok(()),
            Err(AppError::Forbidden(_)) | Err(AppError::NotFound(_)) => Err(AppError::Forbidden(
                "You cannot view this order".to_string(),
            )),
            Err(e) => Err(e),
        }
    }
}
