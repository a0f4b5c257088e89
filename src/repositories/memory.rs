//! In-process implementation of every store trait.
//!
//! All state sits behind one mutex, so each operation (including the whole
//! place-order protocol) is a single critical section. Backs the test
//! suites through `AppState::in_memory`.

use super::{ListingStore, OrderStore, RepoResult, StoreDirectory, UserStore};
use crate::error::RepositoryError;
use crate::models::{
    Listing, ListingSearch, NewListing, NewOrder, NewStore, Order, OrderStatus, Store,
    StoreSearch, User, UserType,
};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct MarketState {
    users: HashMap<Uuid, User>,
    stores: HashMap<Uuid, Store>,
    listings: HashMap<Uuid, Listing>,
    // Insertion order doubles as creation order
    orders: Vec<Order>,
}

impl MarketState {
    fn listing_mut(&mut self, id: Uuid) -> RepoResult<&mut Listing> {
        self.listings
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound("Listing not found".to_string()))
    }

    fn check_reservable(&self, listing_id: Uuid, quantity: i32) -> RepoResult<&Listing> {
        let listing = self
            .listings
            .get(&listing_id)
            .ok_or_else(|| RepositoryError::NotFound("Listing not found".to_string()))?;

        let store_active = self
            .stores
            .get(&listing.store_id)
            .map(|s| s.is_active)
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

    fn decrement(&mut self, listing_id: Uuid, quantity: i32) -> RepoResult<Listing> {
        let listing = self.listing_mut(listing_id)?;
        listing.quantity_left -= quantity;
        listing.updated_at = now();
        Ok(listing.clone())
    }

    fn open_code_in_use(&self, code: &str) -> bool {
        self.orders
            .iter()
            .any(|o| o.pickup_code == code && o.is_open())
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn positive_quantity(quantity: i32) -> RepoResult<()> {
    if quantity <= 0 {
        return Err(RepositoryError::ConstraintViolation(
            "Quantity must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// In-memory marketplace storage
#[derive(Default)]
pub struct InMemoryMarket {
    state: Mutex<MarketState>,
}

impl InMemoryMarket {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MarketState) -> R) -> R {
        // A panic while holding the lock leaves plain data behind; keep serving it.
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

#[async_trait]
impl UserStore for InMemoryMarket {
    async fn create_user(&self, email: &str, name: &str, user_type: UserType) -> RepoResult<User> {
        let email = email.trim().to_lowercase();
        self.with_state(|state| {
            if state.users.values().any(|u| u.email == email) {
                return Err(RepositoryError::Duplicate(format!(
                    "Email {} already registered",
                    email
                )));
            }
            let user = User::new(email, name.to_string(), user_type);
            state.users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    async fn find_user_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.with_state(|state| state.users.get(&id).cloned()))
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self.with_state(|state| state.users.values().find(|u| u.email == email).cloned()))
    }

    async fn set_user_type(&self, id: Uuid, user_type: UserType) -> RepoResult<User> {
        self.with_state(|state| {
            let user = state
                .users
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::NotFound("User not found".to_string()))?;
            user.user_type = user_type.as_str().to_string();
            Ok(user.clone())
        })
    }
}

#[async_trait]
impl StoreDirectory for InMemoryMarket {
    async fn create_store(&self, owner_id: Uuid, input: &NewStore) -> RepoResult<Store> {
        self.with_state(|state| {
            if !state.users.contains_key(&owner_id) {
                return Err(RepositoryError::ConstraintViolation(
                    "Store owner does not exist".to_string(),
                ));
            }
            let timestamp = now();
            let store = Store {
                id: Uuid::new_v4(),
                owner_id,
                name: input.name.clone(),
                description: input.description.clone(),
                address: input.address.clone(),
                latitude: input.latitude,
                longitude: input.longitude,
                category: input.category.clone(),
                is_active: true,
                created_at: timestamp,
                updated_at: timestamp,
            };
            state.stores.insert(store.id, store.clone());
            Ok(store)
        })
    }

    async fn find_store_by_id(&self, id: Uuid) -> RepoResult<Option<Store>> {
        Ok(self.with_state(|state| state.stores.get(&id).cloned()))
    }

    async fn find_stores_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<Store>> {
        Ok(self.with_state(|state| {
            let mut stores: Vec<Store> = state
                .stores
                .values()
                .filter(|s| s.owner_id == owner_id)
                .cloned()
                .collect();
            stores.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            stores
        }))
    }

    async fn set_store_active(&self, id: Uuid, active: bool) -> RepoResult<Store> {
        self.with_state(|state| {
            let store = state
                .stores
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::NotFound("Store not found".to_string()))?;
            store.is_active = active;
            store.updated_at = now();
            Ok(store.clone())
        })
    }

    async fn store_search_candidates(&self, search: &StoreSearch) -> RepoResult<Vec<Store>> {
        let category = search.category_filter();
        let query = search.query_filter().map(str::to_lowercase);

        Ok(self.with_state(|state| {
            state
                .stores
                .values()
                .filter(|s| s.is_active)
                .filter(|s| category.map_or(true, |c| s.category == c))
                .filter(|s| {
                    query
                        .as_deref()
                        .map_or(true, |q| s.name.to_lowercase().contains(q))
                })
                .cloned()
                .collect()
        }))
    }
}

#[async_trait]
impl ListingStore for InMemoryMarket {
    async fn create_listing(&self, input: &NewListing) -> RepoResult<Listing> {
        self.with_state(|state| {
            if !state.stores.contains_key(&input.store_id) {
                return Err(RepositoryError::ConstraintViolation(
                    "Store does not exist".to_string(),
                ));
            }
            let timestamp = now();
            let listing = Listing {
                id: Uuid::new_v4(),
                store_id: input.store_id,
                title: input.title.clone(),
                description: input.description.clone(),
                original_price: input.original_price,
                discounted_price: input.discounted_price,
                quantity_total: input.quantity_total,
                quantity_left: input.quantity_total,
                pickup_start: input.pickup_start,
                pickup_end: input.pickup_end,
                category: input.category.clone(),
                is_active: true,
                created_at: timestamp,
                updated_at: timestamp,
            };
            state.listings.insert(listing.id, listing.clone());
            Ok(listing)
        })
    }

    async fn find_listing_by_id(&self, id: Uuid) -> RepoResult<Option<Listing>> {
        Ok(self.with_state(|state| state.listings.get(&id).cloned()))
    }

    async fn find_active_listings_by_store(&self, store_id: Uuid) -> RepoResult<Vec<Listing>> {
        Ok(self.with_state(|state| {
            let mut listings: Vec<Listing> = state
                .listings
                .values()
                .filter(|l| l.store_id == store_id && l.is_active)
                .cloned()
                .collect();
            listings.sort_by(|a, b| a.pickup_start.cmp(&b.pickup_start));
            listings
        }))
    }

    async fn update_listing(&self, listing: &Listing) -> RepoResult<Listing> {
        self.with_state(|state| {
            let stored = state.listing_mut(listing.id)?;
            stored.title = listing.title.clone();
            stored.description = listing.description.clone();
            stored.original_price = listing.original_price;
            stored.discounted_price = listing.discounted_price;
            stored.pickup_start = listing.pickup_start;
            stored.pickup_end = listing.pickup_end;
            stored.category = listing.category.clone();
            stored.updated_at = now();
            Ok(stored.clone())
        })
    }

    async fn set_listing_active(&self, id: Uuid, active: bool) -> RepoResult<Listing> {
        self.with_state(|state| {
            let listing = state.listing_mut(id)?;
            listing.is_active = active;
            listing.updated_at = now();
            Ok(listing.clone())
        })
    }

    async fn reserve(&self, listing_id: Uuid, quantity: i32) -> RepoResult<Listing> {
        positive_quantity(quantity)?;
        self.with_state(|state| {
            state.check_reservable(listing_id, quantity)?;
            state.decrement(listing_id, quantity)
        })
    }

    async fn listing_search_candidates(
        &self,
        search: &ListingSearch,
    ) -> RepoResult<Vec<(Listing, Store)>> {
        let category = search.category_filter();
        let min_price = search.min_price_filter();
        let max_price = search.max_price_filter();

        Ok(self.with_state(|state| {
            state
                .listings
                .values()
                .filter(|l| l.is_available())
                .filter(|l| category.map_or(true, |c| l.category == c))
                .filter(|l| min_price.map_or(true, |p| l.discounted_price >= p))
                .filter(|l| max_price.map_or(true, |p| l.discounted_price <= p))
                .filter_map(|l| {
                    let store = state.stores.get(&l.store_id).filter(|s| s.is_active)?;
                    Some((l.clone(), store.clone()))
                })
                .collect()
        }))
    }
}

#[async_trait]
impl OrderStore for InMemoryMarket {
    async fn place_order(&self, order: &NewOrder) -> RepoResult<Order> {
        positive_quantity(order.quantity)?;
        self.with_state(|state| {
            let listing = state.check_reservable(order.listing_id, order.quantity)?;
            let total_price = listing.price_for(order.quantity).ok_or_else(|| {
                RepositoryError::ConstraintViolation("Order total is out of range".to_string())
            })?;
            let store_id = listing.store_id;

            if state.open_code_in_use(&order.pickup_code) {
                return Err(RepositoryError::Duplicate(format!(
                    "Pickup code {} is in use",
                    order.pickup_code
                )));
            }

            let timestamp = now();
            let created = Order {
                id: Uuid::new_v4(),
                user_id: order.user_id,
                listing_id: order.listing_id,
                store_id,
                quantity: order.quantity,
                total_price,
                status: OrderStatus::Pending.as_str().to_string(),
                pickup_code: order.pickup_code.clone(),
                notes: order.notes.clone(),
                picked_up_at: None,
                created_at: timestamp,
                updated_at: timestamp,
            };

            state.decrement(order.listing_id, order.quantity)?;
            state.orders.push(created.clone());
            Ok(created)
        })
    }

    async fn find_order_by_id(&self, id: Uuid) -> RepoResult<Option<Order>> {
        Ok(self.with_state(|state| state.orders.iter().find(|o| o.id == id).cloned()))
    }

    async fn find_orders_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Order>> {
        Ok(self.with_state(|state| {
            state
                .orders
                .iter()
                .rev()
                .filter(|o| o.user_id == user_id)
                .cloned()
                .collect()
        }))
    }

    async fn find_orders_by_store(&self, store_id: Uuid) -> RepoResult<Vec<Order>> {
        Ok(self.with_state(|state| {
            state
                .orders
                .iter()
                .rev()
                .filter(|o| o.store_id == store_id)
                .cloned()
                .collect()
        }))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> RepoResult<Order> {
        self.with_state(|state| {
            let order = state
                .orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| RepositoryError::NotFound("Order not found".to_string()))?;

            if order.status_enum() != from {
                return Err(RepositoryError::Stale(format!(
                    "Order is {}, expected {}",
                    order.status, from
                )));
            }

            let timestamp = now();
            order.status = to.as_str().to_string();
            if to == OrderStatus::Completed {
                order.picked_up_at = Some(timestamp);
            }
            order.updated_at = timestamp;
            Ok(order.clone())
        })
    }

    async fn redeem_pickup_code(&self, code: &str) -> RepoResult<Option<Order>> {
        Ok(self.with_state(|state| {
            let order = state
                .orders
                .iter_mut()
                .find(|o| o.pickup_code == code && o.is_open())?;

            let timestamp = now();
            order.status = OrderStatus::Completed.as_str().to_string();
            order.picked_up_at = Some(timestamp);
            order.updated_at = timestamp;
            Some(order.clone())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn seed(market: &InMemoryMarket, quantity: i32) -> Listing {
        tokio_test::block_on(async {
            let owner = market
                .create_user("owner@example.com", "Owner", UserType::Seller)
                .await
                .unwrap();
            let store = market
                .create_store(
                    owner.id,
                    &NewStore {
                        name: "Corner Bakery".to_string(),
                        description: None,
                        address: "1 Main St".to_string(),
                        latitude: 41.33,
                        longitude: 19.82,
                        category: "bakery".to_string(),
                    },
                )
                .await
                .unwrap();
            let start = Utc::now().naive_utc();
            market
                .create_listing(&NewListing {
                    store_id: store.id,
                    title: "Bread bag".to_string(),
                    description: None,
                    original_price: Decimal::new(1000, 2),
                    discounted_price: Decimal::new(400, 2),
                    quantity_total: quantity,
                    pickup_start: start,
                    pickup_end: start + Duration::hours(2),
                    category: "bakery".to_string(),
                })
                .await
                .unwrap()
        })
    }

    #[test]
    fn test_reserve_decrements_and_stops_at_zero() {
        let market = InMemoryMarket::new();
        let listing = seed(&market, 2);

        tokio_test::block_on(async {
            let after = market.reserve(listing.id, 2).await.unwrap();
            assert_eq!(after.quantity_left, 0);

            let err = market.reserve(listing.id, 1).await.unwrap_err();
            assert!(matches!(
                err,
                RepositoryError::InsufficientStock {
                    requested: 1,
                    available: 0
                }
            ));
        });
    }

    #[test]
    fn test_reserve_rejects_inactive_and_missing() {
        let market = InMemoryMarket::new();
        let listing = seed(&market, 5);

        tokio_test::block_on(async {
            market.set_listing_active(listing.id, false).await.unwrap();
            assert!(matches!(
                market.reserve(listing.id, 1).await,
                Err(RepositoryError::Inactive(_))
            ));
            assert!(matches!(
                market.reserve(Uuid::new_v4(), 1).await,
                Err(RepositoryError::NotFound(_))
            ));
            assert!(matches!(
                market.reserve(listing.id, 0).await,
                Err(RepositoryError::ConstraintViolation(_))
            ));
        });
    }

    #[test]
    fn test_code_reusable_once_order_closed() {
        let market = InMemoryMarket::new();
        let listing = seed(&market, 5);
        let buyer = Uuid::new_v4();
        let new_order = NewOrder {
            user_id: buyer,
            listing_id: listing.id,
            quantity: 1,
            notes: None,
            pickup_code: "ABC123".to_string(),
        };

        tokio_test::block_on(async {
            market.place_order(&new_order).await.unwrap();
            assert!(matches!(
                market.place_order(&new_order).await,
                Err(RepositoryError::Duplicate(_))
            ));
            // the failed attempt must not have touched stock
            let current = market.find_listing_by_id(listing.id).await.unwrap().unwrap();
            assert_eq!(current.quantity_left, 4);

            market.redeem_pickup_code("ABC123").await.unwrap().unwrap();
            market.place_order(&new_order).await.unwrap();
        });
    }
}
