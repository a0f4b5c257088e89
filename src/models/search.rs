use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Listing, Store};

/// Nearby search for listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingSearch {
    pub latitude: f64,
    pub longitude: f64,
    /// Kilometres; missing or non-positive falls back to the configured default
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
}

impl ListingSearch {
    /// Category filter, ignoring blanks
    pub fn category_filter(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    /// Lower price bound, ignoring non-positive values
    pub fn min_price_filter(&self) -> Option<Decimal> {
        self.min_price.filter(|p| *p > Decimal::ZERO)
    }

    /// Upper price bound, ignoring non-positive values
    pub fn max_price_filter(&self) -> Option<Decimal> {
        self.max_price.filter(|p| *p > Decimal::ZERO)
    }
}

/// Nearby search for stores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSearch {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    /// Case-insensitive substring of the store name
    #[serde(default)]
    pub query: Option<String>,
}

impl StoreSearch {
    pub fn category_filter(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    pub fn query_filter(&self) -> Option<&str> {
        non_blank(self.query.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A listing annotated with its distance from the search centre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub discount_percent: i32,
    pub distance_km: f64,
    pub store: AnnotatedStore,
}

/// A store annotated with its distance from the search centre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedStore {
    #[serde(flatten)]
    pub store: Store,
    pub distance_km: f64,
}
