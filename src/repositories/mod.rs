//! Persistence seams.
//!
//! Services talk to these traits; `*Repository` types implement them on
//! Postgres and [`memory::InMemoryMarket`] implements all of them in process.

pub mod listing_repository;
pub mod memory;
pub mod order_repository;
pub mod store_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use listing_repository::ListingRepository;
pub use memory::InMemoryMarket;
pub use order_repository::OrderRepository;
pub use store_repository::StoreRepository;
pub use user_repository::UserRepository;

use crate::error::RepositoryError;
use crate::models::{
    Listing, ListingSearch, NewListing, NewOrder, NewStore, Order, OrderStatus, Store,
    StoreSearch, User, UserType,
};
use async_trait::async_trait;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepositoryError>;

/// User directory
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, email: &str, name: &str, user_type: UserType) -> RepoResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Explicit account-type change, e.g. promotion to seller
    async fn set_user_type(&self, id: Uuid, user_type: UserType) -> RepoResult<User>;
}

/// Store directory
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    async fn create_store(&self, owner_id: Uuid, input: &NewStore) -> RepoResult<Store>;

    async fn find_store_by_id(&self, id: Uuid) -> RepoResult<Option<Store>>;

    async fn find_stores_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<Store>>;

    async fn set_store_active(&self, id: Uuid, active: bool) -> RepoResult<Store>;

    /// Active stores matching the equality/name predicates. No distance filtering.
    async fn store_search_candidates(&self, search: &StoreSearch) -> RepoResult<Vec<Store>>;
}

/// Listing inventory
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Insert with `quantity_left = quantity_total`
    async fn create_listing(&self, input: &NewListing) -> RepoResult<Listing>;

    async fn find_listing_by_id(&self, id: Uuid) -> RepoResult<Option<Listing>>;

    async fn find_active_listings_by_store(&self, store_id: Uuid) -> RepoResult<Vec<Listing>>;

    /// Persist the editable fields of `listing`. Quantities are never written here.
    async fn update_listing(&self, listing: &Listing) -> RepoResult<Listing>;

    async fn set_listing_active(&self, id: Uuid, active: bool) -> RepoResult<Listing>;

    /// Check existence, active flag and stock, then decrement, as one step per listing
    async fn reserve(&self, listing_id: Uuid, quantity: i32) -> RepoResult<Listing>;

    /// Active, in-stock listings of active stores matching category and price bounds,
    /// each paired with its store. No distance filtering.
    async fn listing_search_candidates(
        &self,
        search: &ListingSearch,
    ) -> RepoResult<Vec<(Listing, Store)>>;
}

/// Order ledger
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Validate the listing, write the order and decrement stock atomically.
    ///
    /// Fails with `Duplicate` when `order.pickup_code` is held by another open
    /// order; nothing is written in that case.
    async fn place_order(&self, order: &NewOrder) -> RepoResult<Order>;

    async fn find_order_by_id(&self, id: Uuid) -> RepoResult<Option<Order>>;

    /// Newest first
    async fn find_orders_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Order>>;

    /// Newest first
    async fn find_orders_by_store(&self, store_id: Uuid) -> RepoResult<Vec<Order>>;

    /// Compare-and-set the status. Entering `completed` stamps `picked_up_at`.
    ///
    /// Fails with `Stale` when the order is no longer in `from`.
    async fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> RepoResult<Order>;

    /// Complete the open order holding `code`, if any
    async fn redeem_pickup_code(&self, code: &str) -> RepoResult<Option<Order>>;
}
