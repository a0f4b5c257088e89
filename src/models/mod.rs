//! Domain models for the FoodVerse backend.
//!
//! Database-backed entities plus the search request/response shapes.

pub mod listing;
pub mod order;
pub mod search;
pub mod store;
pub mod user;

// Re-export all models for convenient access
pub use listing::{discount_percent, max_price, Listing, ListingUpdate, NewListing};
pub use order::{NewOrder, Order, OrderStatus};
pub use search::{AnnotatedListing, AnnotatedStore, ListingSearch, StoreSearch};
pub use store::{NewStore, Store};
pub use user::{User, UserType};
