use crate::error::{AppError, AppResult};
use crate::models::{Listing, ListingUpdate, NewListing, NewStore, Store};
use crate::repositories::{ListingStore, StoreDirectory, UserStore};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for managing stores and their food bags
pub struct CatalogService {
    users: Arc<dyn UserStore>,
    stores: Arc<dyn StoreDirectory>,
    listings: Arc<dyn ListingStore>,
}

impl CatalogService {
    pub fn new(
        users: Arc<dyn UserStore>,
        stores: Arc<dyn StoreDirectory>,
        listings: Arc<dyn ListingStore>,
    ) -> Self {
        Self {
            users,
            stores,
            listings,
        }
    }

    /// Open a store owned by `owner_id`
    pub async fn create_store(&self, owner_id: Uuid, input: NewStore) -> AppResult<Store> {
        input.validate().map_err(AppError::Validation)?;

        self.users
            .find_user_by_id(owner_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

        let store = self.stores.create_store(owner_id, &input).await?;
        info!("Store created: id={}, owner={}", store.id, owner_id);
        Ok(store)
    }

    pub async fn get_store(&self, store_id: Uuid) -> AppResult<Store> {
        self.stores
            .find_store_by_id(store_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))
    }

    pub async fn list_stores_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Store>> {
        Ok(self.stores.find_stores_by_owner(owner_id).await?)
    }

    /// Deactivate a store; its listings drop out of search and placement
    pub async fn deactivate_store(&self, store_id: Uuid, user_id: Uuid) -> AppResult<Store> {
        self.owned_store(store_id, user_id).await?;
        let store = self.stores.set_store_active(store_id, false).await?;
        info!("Store deactivated: id={}", store_id);
        Ok(store)
    }

    /// Create a food bag in one of the caller's active stores
    pub async fn create_listing(&self, user_id: Uuid, mut input: NewListing) -> AppResult<Listing> {
        input.validate().map_err(AppError::Validation)?;

        let store = self.owned_store(input.store_id, user_id).await?;
        if !store.is_active {
            return Err(AppError::Inactive("Store is not active".to_string()));
        }

        if input.category.trim().is_empty() {
            input.category = store.category.clone();
        }

        let listing = self.listings.create_listing(&input).await?;
        info!(
            "Listing created: id={}, store={}, quantity={}",
            listing.id, store.id, listing.quantity_total
        );
        Ok(listing)
    }

    pub async fn get_listing(&self, listing_id: Uuid) -> AppResult<Listing> {
        self.listings
            .find_listing_by_id(listing_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Food bag not found".to_string()))
    }

    pub async fn list_active_listings(&self, store_id: Uuid) -> AppResult<Vec<Listing>> {
        Ok(self.listings.find_active_listings_by_store(store_id).await?)
    }

    /// Edit a food bag. Existing orders keep the price they were placed at.
    pub async fn update_listing(
        &self,
        listing_id: Uuid,
        user_id: Uuid,
        update: ListingUpdate,
    ) -> AppResult<Listing> {
        let listing = self.get_listing(listing_id).await?;
        self.owned_store(listing.store_id, user_id).await?;

        let edited = update.apply_to(&listing).map_err(AppError::Validation)?;
        let saved = self.listings.update_listing(&edited).await?;
        info!("Listing updated: id={}", listing_id);
        Ok(saved)
    }

    pub async fn deactivate_listing(&self, listing_id: Uuid, user_id: Uuid) -> AppResult<Listing> {
        let listing = self.get_listing(listing_id).await?;
        self.owned_store(listing.store_id, user_id).await?;

        let listing = self.listings.set_listing_active(listing_id, false).await?;
        info!("Listing deactivated: id={}", listing_id);
        Ok(listing)
    }

    async fn owned_store(&self, store_id: Uuid, user_id: Uuid) -> AppResult<Store> {
        let store = self.get_store(store_id).await?;
        if !store.is_owned_by(user_id) {
            return Err(AppError::Forbidden("You do not own this store".to_string()));
        }
        Ok(store)
    }
}
