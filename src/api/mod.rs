//! REST transport.
//!
//! Thin axum layer over the services; every route lives under `/api/v1`.

pub mod extract;
pub mod handlers;

pub use extract::AuthUser;

use crate::AppState;
use axum::http::{header, Method};
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let v1 = Router::new()
        .route("/health", get(handlers::health))
        // stores
        .route("/stores", post(handlers::create_store))
        .route("/stores/my", get(handlers::my_stores))
        .route("/stores/search", post(handlers::search_stores))
        .route(
            "/stores/{id}",
            get(handlers::get_store).delete(handlers::deactivate_store),
        )
        .route("/stores/{id}/food-bags", get(handlers::store_listings))
        .route("/stores/{id}/orders", get(handlers::store_orders))
        // food bags
        .route("/food-bags", post(handlers::create_listing))
        .route("/food-bags/search", post(handlers::search_listings))
        .route(
            "/food-bags/{id}",
            get(handlers::get_listing)
                .put(handlers::update_listing)
                .delete(handlers::deactivate_listing),
        )
        // orders
        .route("/orders", post(handlers::place_order))
        .route("/orders/my", get(handlers::my_orders))
        .route("/orders/verify-pickup", post(handlers::verify_pickup))
        .route("/orders/{id}", get(handlers::get_order))
        .route("/orders/{id}/status", put(handlers::update_order_status))
        // users
        .route("/user/stats", get(handlers::user_stats));

    Router::new()
        .nest("/api/v1", v1)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
