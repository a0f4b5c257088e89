use crate::error::{AppError, AppResult};
use crate::geo::Coordinate;
use crate::models::{AnnotatedListing, AnnotatedStore, Listing, ListingSearch, Store, StoreSearch};
use crate::repositories::{ListingStore, StoreDirectory};
use std::sync::Arc;
use tracing::debug;

/// Service for nearby store and listing search
pub struct SearchService {
    listings: Arc<dyn ListingStore>,
    stores: Arc<dyn StoreDirectory>,
    default_radius_km: f64,
}

impl SearchService {
    pub fn new(
        listings: Arc<dyn ListingStore>,
        stores: Arc<dyn StoreDirectory>,
        default_radius_km: f64,
    ) -> Self {
        Self {
            listings,
            stores,
            default_radius_km,
        }
    }

    /// Available listings within the radius, nearest first
    pub async fn search_listings(&self, search: &ListingSearch) -> AppResult<Vec<AnnotatedListing>> {
        let centre = search_centre(search.latitude, search.longitude)?;
        let radius = effective_radius(search.radius, self.default_radius_km);

        let candidates = self.listings.listing_search_candidates(search).await?;
        debug!(
            "Listing search: {} candidates, radius {} km",
            candidates.len(),
            radius
        );

        Ok(annotate_listings(centre, radius, candidates))
    }

    /// Active stores within the radius, nearest first
    pub async fn search_stores(&self, search: &StoreSearch) -> AppResult<Vec<AnnotatedStore>> {
        let centre = search_centre(search.latitude, search.longitude)?;
        let radius = effective_radius(search.radius, self.default_radius_km);

        let candidates = self.stores.store_search_candidates(search).await?;
        debug!(
            "Store search: {} candidates, radius {} km",
            candidates.len(),
            radius
        );

        Ok(annotate_stores(centre, radius, candidates))
    }
}

fn search_centre(latitude: f64, longitude: f64) -> AppResult<Coordinate> {
    let centre = Coordinate::new(latitude, longitude);
    centre.validate().map_err(AppError::Validation)?;
    Ok(centre)
}

/// The requested radius, or `default_km` when absent, non-positive or not finite
pub fn effective_radius(requested: Option<f64>, default_km: f64) -> f64 {
    requested
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(default_km)
}

/// Keep stores within `radius_km` of `centre`, sorted by distance
pub fn annotate_stores(centre: Coordinate, radius_km: f64, stores: Vec<Store>) -> Vec<AnnotatedStore> {
    let mut annotated: Vec<AnnotatedStore> = stores
        .into_iter()
        .filter_map(|store| {
            let distance_km = centre.distance_km(&store.coordinate());
            (distance_km <= radius_km).then_some(AnnotatedStore { store, distance_km })
        })
        .collect();

    annotated.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    annotated
}

/// Keep listings whose store lies within `radius_km` of `centre`, sorted by distance
pub fn annotate_listings(
    centre: Coordinate,
    radius_km: f64,
    candidates: Vec<(Listing, Store)>,
) -> Vec<AnnotatedListing> {
    let mut annotated: Vec<AnnotatedListing> = candidates
        .into_iter()
        .filter_map(|(listing, store)| {
            let distance_km = centre.distance_km(&store.coordinate());
            if distance_km > radius_km {
                return None;
            }
            Some(AnnotatedListing {
                discount_percent: listing.discount_percent(),
                listing,
                distance_km,
                store: AnnotatedStore { store, distance_km },
            })
        })
        .collect();

    annotated.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    annotated
}
