pub mod catalog;
pub mod order_service;
pub mod pickup_code;
pub mod search_service;
pub mod stats;

pub use catalog::CatalogService;
pub use order_service::{OrderService, MAX_PICKUP_CODE_ATTEMPTS};
pub use pickup_code::{PickupCodeGenerator, RandomPickupCodes};
pub use search_service::SearchService;
pub use stats::{StatsService, UserStats};
