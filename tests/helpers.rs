#![allow(dead_code)]

use chrono::{Duration, NaiveDateTime, Utc};
use foodverse_backend::geo::EARTH_RADIUS_KM;
use foodverse_backend::models::*;
use foodverse_backend::repositories::*;
use foodverse_backend::services::{PickupCodeGenerator, RandomPickupCodes};
use foodverse_backend::{AppConfig, AppState};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Tirana city centre, used as the default store location
pub const CENTRE: (f64, f64) = (41.3275, 19.8187);

/// Services wired over a fresh in-memory market
pub struct TestApp {
    pub market: Arc<InMemoryMarket>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_codes(Arc::new(RandomPickupCodes))
    }

    pub fn with_codes(codes: Arc<dyn PickupCodeGenerator>) -> Self {
        let market = Arc::new(InMemoryMarket::new());
        let state = Arc::new(AppState::in_memory(
            market.clone(),
            codes,
            &AppConfig::default(),
        ));
        Self { market, state }
    }

    pub async fn user(&self, email: &str, user_type: UserType) -> User {
        self.market
            .create_user(email, "Test User", user_type)
            .await
            .expect("Failed to create user")
    }

    pub async fn store_at(&self, owner: &User, latitude: f64, longitude: f64) -> Store {
        self.state
            .catalog
            .create_store(owner.id, new_store("Test Store", latitude, longitude, "bakery"))
            .await
            .expect("Failed to create store")
    }

    pub async fn listing(&self, owner: &User, store: &Store, quantity: i32) -> Listing {
        self.state
            .catalog
            .create_listing(owner.id, new_listing(store.id, quantity, "10.00", "4.00"))
            .await
            .expect("Failed to create listing")
    }

    pub async fn quantity_left(&self, listing_id: Uuid) -> i32 {
        self.market
            .find_listing_by_id(listing_id)
            .await
            .expect("Failed to load listing")
            .expect("Listing missing")
            .quantity_left
    }
}

/// Seller, store and listing in one go
pub struct Fixtures {
    pub seller: User,
    pub buyer: User,
    pub store: Store,
    pub listing: Listing,
}

impl Fixtures {
    pub async fn create(app: &TestApp, quantity: i32) -> Self {
        let seller = app.user("seller@example.com", UserType::Seller).await;
        let buyer = app.user("buyer@example.com", UserType::Consumer).await;
        let store = app.store_at(&seller, CENTRE.0, CENTRE.1).await;
        let listing = app.listing(&seller, &store, quantity).await;
        Self {
            seller,
            buyer,
            store,
            listing,
        }
    }
}

pub fn price(s: &str) -> Decimal {
    s.parse().expect("Invalid decimal literal")
}

pub fn pickup_window() -> (NaiveDateTime, NaiveDateTime) {
    let start = Utc::now().naive_utc() + Duration::hours(1);
    (start, start + Duration::hours(2))
}

pub fn new_store(name: &str, latitude: f64, longitude: f64, category: &str) -> NewStore {
    NewStore {
        name: name.to_string(),
        description: Some("Fresh every morning".to_string()),
        address: "Rruga e Durresit 1".to_string(),
        latitude,
        longitude,
        category: category.to_string(),
    }
}

pub fn new_listing(store_id: Uuid, quantity: i32, original: &str, discounted: &str) -> NewListing {
    let (pickup_start, pickup_end) = pickup_window();
    NewListing {
        store_id,
        title: "Surprise bag".to_string(),
        description: None,
        original_price: price(original),
        discounted_price: price(discounted),
        quantity_total: quantity,
        pickup_start,
        pickup_end,
        category: String::new(),
    }
}

/// The point `km` kilometres due north of `(latitude, longitude)`
pub fn north_of(latitude: f64, longitude: f64, km: f64) -> (f64, f64) {
    let degrees_per_km = 180.0 / (std::f64::consts::PI * EARTH_RADIUS_KM);
    (latitude + km * degrees_per_km, longitude)
}

/// Hands out queued codes first, then random ones
pub struct ScriptedCodes {
    queue: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ScriptedCodes {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            queue: Mutex::new(codes.iter().map(|c| c.to_string()).collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl PickupCodeGenerator for ScriptedCodes {
    fn generate(&self) -> String {
        *self.calls.lock().unwrap() += 1;
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| RandomPickupCodes.generate())
    }
}

/// Always returns the same code
pub struct ConstantCode(pub &'static str);

impl PickupCodeGenerator for ConstantCode {
    fn generate(&self) -> String {
        self.0.to_string()
    }
}
