use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Listing model: a quantity-limited, time-windowed food bag offered by a store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub store_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub original_price: Decimal,   // NUMERIC(10, 2)
    pub discounted_price: Decimal, // NUMERIC(10, 2), 0 < discounted <= original
    pub quantity_total: i32,
    pub quantity_left: i32,
    pub pickup_start: NaiveDateTime,
    pub pickup_end: NaiveDateTime,
    pub category: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Listing {
    /// Percentage saved against the original price, truncated toward zero
    pub fn discount_percent(&self) -> i32 {
        discount_percent(self.original_price, self.discounted_price)
    }

    /// Price of `quantity` bags at the current discounted price; `None` on overflow
    pub fn price_for(&self, quantity: i32) -> Option<Decimal> {
        self.discounted_price.checked_mul(Decimal::from(quantity))
    }

    pub fn is_available(&self) -> bool {
        self.is_active && self.quantity_left > 0
    }
}

/// `trunc((original - discounted) / original * 100)`; zero when `original` is not positive
pub fn discount_percent(original: Decimal, discounted: Decimal) -> i32 {
    if original <= Decimal::ZERO {
        return 0;
    }
    ((original - discounted) / original * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i32()
        .unwrap_or(0)
}

/// Largest price a `NUMERIC(10, 2)` column holds
pub fn max_price() -> Decimal {
    Decimal::new(99_999_999_99, 2)
}

fn validate_price_bounds(label: &str, price: Decimal) -> Result<(), String> {
    if price.normalize().scale() > 2 {
        return Err(format!("{} price has more than two decimal places", label));
    }
    if price > max_price() {
        return Err(format!("{} price cannot exceed {}", label, max_price()));
    }
    Ok(())
}

fn validate_prices(original: Decimal, discounted: Decimal) -> Result<(), String> {
    validate_price_bounds("Original", original)?;
    validate_price_bounds("Discounted", discounted)?;
    if original <= Decimal::ZERO {
        return Err("Original price must be greater than zero".to_string());
    }
    if discounted <= Decimal::ZERO {
        return Err("Discounted price must be greater than zero".to_string());
    }
    if discounted > original {
        return Err("Discounted price cannot exceed the original price".to_string());
    }
    Ok(())
}

fn validate_window(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), String> {
    if start >= end {
        return Err("Pickup window must start before it ends".to_string());
    }
    Ok(())
}

/// Input for creating a listing; `quantity_left` always starts at `quantity_total`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewListing {
    pub store_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub original_price: Decimal,
    pub discounted_price: Decimal,
    pub quantity_total: i32,
    pub pickup_start: NaiveDateTime,
    pub pickup_end: NaiveDateTime,
    #[serde(default)]
    pub category: String,
}

impl NewListing {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if self.quantity_total <= 0 {
            return Err("Quantity must be greater than zero".to_string());
        }
        validate_prices(self.original_price, self.discounted_price)?;
        validate_window(self.pickup_start, self.pickup_end)
    }
}

/// Owner edits to a listing. Quantities are deliberately absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub original_price: Option<Decimal>,
    pub discounted_price: Option<Decimal>,
    pub pickup_start: Option<NaiveDateTime>,
    pub pickup_end: Option<NaiveDateTime>,
    pub category: Option<String>,
}

impl ListingUpdate {
    /// Apply the edit to a copy of `listing`, validating the result
    pub fn apply_to(&self, listing: &Listing) -> Result<Listing, String> {
        let mut updated = listing.clone();
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err("Title is required".to_string());
            }
            updated.title = title.clone();
        }
        if let Some(description) = &self.description {
            updated.description = Some(description.clone());
        }
        if let Some(price) = self.original_price {
            updated.original_price = price;
        }
        if let Some(price) = self.discounted_price {
            updated.discounted_price = price;
        }
        if let Some(start) = self.pickup_start {
            updated.pickup_start = start;
        }
        if let Some(end) = self.pickup_end {
            updated.pickup_end = end;
        }
        if let Some(category) = &self.category {
            updated.category = category.clone();
        }

        validate_prices(updated.original_price, updated.discounted_price)?;
        validate_window(updated.pickup_start, updated.pickup_end)?;
        updated.updated_at = chrono::Utc::now().naive_utc();
        Ok(updated)
    }
}
