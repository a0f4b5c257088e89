use crate::error::AppResult;
use crate::models::{Listing, OrderStatus};
use crate::repositories::{ListingStore, OrderStore};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const FAVORITE_CATEGORY_COUNT: usize = 3;

/// Order history summary for one buyer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_orders: usize,
    pub completed_orders: usize,
    pub cancelled_orders: usize,
    pub total_spent: Decimal,
    pub total_saved: Decimal,
    pub favorite_categories: Vec<String>,
}

pub struct StatsService {
    orders: Arc<dyn OrderStore>,
    listings: Arc<dyn ListingStore>,
}

impl StatsService {
    pub fn new(orders: Arc<dyn OrderStore>, listings: Arc<dyn ListingStore>) -> Self {
        Self { orders, listings }
    }

    /// Totals over every order the user placed. Cancelled orders count
    /// towards `total_orders` only.
    pub async fn user_stats(&self, user_id: Uuid) -> AppResult<UserStats> {
        let orders = self.orders.find_orders_by_user(user_id).await?;

        let mut listing_ids: Vec<Uuid> = orders.iter().map(|o| o.listing_id).collect();
        listing_ids.sort();
        listing_ids.dedup();

        let listings: HashMap<Uuid, Listing> = try_join_all(
            listing_ids
                .iter()
                .map(|id| self.listings.find_listing_by_id(*id)),
        )
        .await?
        .into_iter()
        .flatten()
        .map(|l| (l.id, l))
        .collect();

        let mut stats = UserStats {
            total_orders: orders.len(),
            completed_orders: 0,
            cancelled_orders: 0,
            total_spent: Decimal::ZERO,
            total_saved: Decimal::ZERO,
            favorite_categories: Vec::new(),
        };
        let mut categories = Vec::new();

        for order in &orders {
            match order.status_enum() {
                OrderStatus::Cancelled => {
                    stats.cancelled_orders += 1;
                    continue;
                }
                OrderStatus::Completed => stats.completed_orders += 1,
                _ => {}
            }

            stats.total_spent += order.total_price;
            if let Some(listing) = listings.get(&order.listing_id) {
                stats.total_saved += (listing.original_price - listing.discounted_price)
                    * Decimal::from(order.quantity);
                categories.push(listing.category.clone());
            }
        }

        stats.favorite_categories = favorite_categories(&categories, FAVORITE_CATEGORY_COUNT);
        Ok(stats)
    }
}

/// Most frequent categories, ties broken alphabetically
pub fn favorite_categories(categories: &[String], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for category in categories.iter().filter(|c| !c.is_empty()) {
        *counts.entry(category.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(c, _)| c.to_string())
        .collect()
}
