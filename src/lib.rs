//! FoodVerse Backend Library
//!
//! Order placement with atomic stock reservation, pickup-code redemption and
//! nearby search for a surplus-food marketplace. Exposed as a library for the
//! binary and the integration tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod geo;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use auth::JwtManager;
use database::Database;
use repositories::*;
use services::*;
use std::sync::Arc;

/// Application state shared by every request handler
pub struct AppState {
    /// Present when backed by Postgres; used by the health check
    pub database: Option<Database>,
    pub users: Arc<dyn UserStore>,
    pub jwt: Arc<JwtManager>,
    pub orders: Arc<OrderService>,
    pub search: Arc<SearchService>,
    pub catalog: Arc<CatalogService>,
    pub stats: Arc<StatsService>,
}

impl AppState {
    /// Wire the services over arbitrary storage
    pub fn new(
        users: Arc<dyn UserStore>,
        stores: Arc<dyn StoreDirectory>,
        listings: Arc<dyn ListingStore>,
        orders: Arc<dyn OrderStore>,
        codes: Arc<dyn PickupCodeGenerator>,
        config: &AppConfig,
    ) -> Self {
        Self {
            database: None,
            users: users.clone(),
            jwt: Arc::new(JwtManager::from_config(&config.auth)),
            orders: Arc::new(OrderService::new(orders.clone(), stores.clone(), codes)),
            search: Arc::new(SearchService::new(
                listings.clone(),
                stores.clone(),
                config.default_search_radius_km,
            )),
            catalog: Arc::new(CatalogService::new(users, stores, listings.clone())),
            stats: Arc::new(StatsService::new(orders, listings)),
        }
    }

    /// Postgres-backed state
    pub fn postgres(pool: sqlx::PgPool, config: &AppConfig) -> Self {
        let mut state = Self::new(
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(StoreRepository::new(pool.clone())),
            Arc::new(ListingRepository::new(pool.clone())),
            Arc::new(OrderRepository::new(pool.clone())),
            Arc::new(RandomPickupCodes),
            config,
        );
        state.database = Some(Database::new(pool));
        state
    }

    /// State over a single in-process market
    pub fn in_memory(
        market: Arc<InMemoryMarket>,
        codes: Arc<dyn PickupCodeGenerator>,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            market.clone(),
            market.clone(),
            market.clone(),
            market,
            codes,
            config,
        )
    }
}
