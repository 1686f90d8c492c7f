//! Place-name search backed by the Open-Meteo geocoding API.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cache::TtlCache;
use crate::geo::GeoValidator;
use crate::models::Point;
use crate::{PlannerError, Result};

mod openmeteo {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResponse {
        pub results: Option<Vec<GeocodingResult>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResult {
        pub name: String,
        pub latitude: f64,
        pub longitude: f64,
        pub country: Option<String>,
        pub admin1: Option<String>,
    }
}

/// A named location returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub country: Option<String>,
    /// First-level administrative area (district, state)
    pub region: Option<String>,
    pub point: Point,
}

impl Place {
    /// "Name, Region" when a region is known
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.region {
            Some(region) => format!("{}, {}", self.name, region),
            None => self.name.clone(),
        }
    }
}

pub struct LocationSearch {
    client: ClientWithMiddleware,
    url: String,
    max_results: u32,
    cache: TtlCache<String, Arc<Vec<Place>>>,
}

impl LocationSearch {
    #[must_use]
    pub fn new(
        client: ClientWithMiddleware,
        url: String,
        max_results: u32,
        cache_capacity: NonZeroUsize,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            client,
            url,
            max_results,
            cache: TtlCache::new("location_search", cache_capacity, cache_ttl),
        }
    }

    /// Search places by name.
    ///
    /// Blank queries return nothing without contacting the backend.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Arc<Vec<Place>>> {
        let key = query.trim().to_lowercase();
        if key.is_empty() {
            return Ok(Arc::new(Vec::new()));
        }
        if let Some(cached) = self.cache.get(&key) {
            debug!("Serving '{}' from cache", key);
            return Ok(cached);
        }

        let start_time = Instant::now();
        let url = format!(
            "{}?name={}&count={}&language=en&format=json",
            self.url,
            urlencoding::encode(query.trim()),
            self.max_results
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PlannerError::geocoding(format!("request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(PlannerError::geocoding(format!(
                "search failed with status {}",
                response.status()
            )));
        }

        let parsed: openmeteo::GeocodingResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse geocoding response for '{}': {}", key, e);
            PlannerError::geocoding(format!("invalid response: {e}"))
        })?;

        let places: Vec<Place> = parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|result| {
                match GeoValidator::normalize_lat_lon(result.latitude, result.longitude) {
                    Ok(point) => Some(Place {
                        name: result.name,
                        country: result.country,
                        region: result.admin1,
                        point,
                    }),
                    Err(e) => {
                        debug!("Dropping '{}': {}", result.name, e);
                        None
                    }
                }
            })
            .collect();

        info!(
            "Found {} places for '{}' in {:.3}s",
            places.len(),
            key,
            start_time.elapsed().as_secs_f64()
        );

        let places = Arc::new(places);
        self.cache.put(key, Arc::clone(&places));
        Ok(places)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
