use super::AuthUser;
use crate::error::AppResult;
use crate::models::{
    AnnotatedListing, AnnotatedStore, Listing, ListingSearch, ListingUpdate, NewListing,
    NewStore, Order, Store, StoreSearch,
};
use crate::services::UserStats;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

type SharedState = State<Arc<AppState>>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
}

/// Listing as returned by the catalog endpoints
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    #[serde(flatten)]
    pub listing: Listing,
    pub discount_percent: i32,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            discount_percent: listing.discount_percent(),
            listing,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(alias = "listing_id")]
    pub food_bag_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPickupRequest {
    pub pickup_code: String,
}

pub async fn health(State(state): SharedState) -> (StatusCode, Json<HealthResponse>) {
    match &state.database {
        None => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                storage: "memory",
            }),
        ),
        Some(db) => match db.ping().await {
            Ok(()) => (
                StatusCode::OK,
                Json(HealthResponse {
                    status: "ok",
                    storage: "postgres",
                }),
            ),
            Err(e) => {
                warn!("Health check failed: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(HealthResponse {
                        status: "degraded",
                        storage: "postgres",
                    }),
                )
            }
        },
    }
}

// ============================================================================
// Stores
// ============================================================================

pub async fn create_store(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
    Json(input): Json<NewStore>,
) -> AppResult<(StatusCode, Json<Store>)> {
    let store = state.catalog.create_store(user_id, input).await?;
    Ok((StatusCode::CREATED, Json(store)))
}

pub async fn my_stores(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Store>>> {
    Ok(Json(state.catalog.list_stores_by_owner(user_id).await?))
}

pub async fn search_stores(
    State(state): SharedState,
    Json(search): Json<StoreSearch>,
) -> AppResult<Json<Vec<AnnotatedStore>>> {
    Ok(Json(state.search.search_stores(&search).await?))
}

pub async fn get_store(
    State(state): SharedState,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<Store>> {
    Ok(Json(state.catalog.get_store(store_id).await?))
}

pub async fn deactivate_store(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<Store>> {
    Ok(Json(state.catalog.deactivate_store(store_id, user_id).await?))
}

pub async fn store_listings(
    State(state): SharedState,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<Vec<ListingResponse>>> {
    let listings = state.catalog.list_active_listings(store_id).await?;
    Ok(Json(listings.into_iter().map(ListingResponse::from).collect()))
}

pub async fn store_orders(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<Vec<Order>>> {
    state.orders.ensure_store_owner(store_id, user_id).await?;
    Ok(Json(state.orders.list_orders_by_store(store_id).await?))
}

// ============================================================================
// Food bags
// ============================================================================

pub async fn create_listing(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
    Json(input): Json<NewListing>,
) -> AppResult<(StatusCode, Json<ListingResponse>)> {
    let listing = state.catalog.create_listing(user_id, input).await?;
    Ok((StatusCode::CREATED, Json(listing.into())))
}

pub async fn search_listings(
    State(state): SharedState,
    Json(search): Json<ListingSearch>,
) -> AppResult<Json<Vec<AnnotatedListing>>> {
    Ok(Json(state.search.search_listings(&search).await?))
}

pub async fn get_listing(
    State(state): SharedState,
    Path(listing_id): Path<Uuid>,
) -> AppResult<Json<ListingResponse>> {
    Ok(Json(state.catalog.get_listing(listing_id).await?.into()))
}

pub async fn update_listing(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
    Path(listing_id): Path<Uuid>,
    Json(update): Json<ListingUpdate>,
) -> AppResult<Json<ListingResponse>> {
    let listing = state
        .catalog
        .update_listing(listing_id, user_id, update)
        .await?;
    Ok(Json(listing.into()))
}

pub async fn deactivate_listing(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
    Path(listing_id): Path<Uuid>,
) -> AppResult<Json<ListingResponse>> {
    let listing = state
        .catalog
        .deactivate_listing(listing_id, user_id)
        .await?;
    Ok(Json(listing.into()))
}

// ============================================================================
// Orders
// ============================================================================

pub async fn place_order(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
    Json(req): Json<PlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<Order>)> {
    info!(
        "PlaceOrder request: user={}, food_bag={}, quantity={}",
        user_id, req.food_bag_id, req.quantity
    );
    let order = state
        .orders
        .place_order(user_id, req.food_bag_id, req.quantity, req.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn my_orders(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list_orders_by_user(user_id).await?))
}

pub async fn get_order(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get_order(order_id).await?;
    state.orders.ensure_order_visible_to(&order, user_id).await?;
    Ok(Json(order))
}

pub async fn update_order_status(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get_order(order_id).await?;
    state
        .orders
        .ensure_store_owner(order.store_id, user_id)
        .await?;

    let order = state
        .orders
        .update_order_status(order_id, &req.status)
        .await?;
    Ok(Json(order))
}

pub async fn verify_pickup(
    State(state): SharedState,
    AuthUser(_user_id): AuthUser,
    Json(req): Json<VerifyPickupRequest>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.verify_pickup_code(&req.pickup_code).await?))
}

// ============================================================================
// Users
// ============================================================================

pub async fn user_stats(
    State(state): SharedState,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<UserStats>> {
    Ok(Json(state.stats.user_stats(user_id).await?))
}
