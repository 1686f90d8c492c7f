//! Route resolution pipeline.
//!
//! `resolve_route` runs a fixed sequence of stages, each with one job:
//! validate the request, obtain a route (cached, single-flight, provider
//! chain), annotate elevation, compute statistics, and split into days.

use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::PlannerConfig;
use crate::elevation::{Annotation, ElevationAnnotator, ElevationBackend, OpenElevationBackend};
use crate::geo::GeoValidator;
use crate::http::build_client;
use crate::models::{DaySegment, Route, Waypoint};
use crate::routing::{
    OsrmProvider, ProviderChain, RouteCache, RouteKey, RouteRequest, TrailNetworkProvider,
};
use crate::segmenter::DaySegmenter;
use crate::stats::{ElevationStatus, RouteStats, StatsEngine};
use crate::trails::OverpassTrailIndex;
use crate::{PlannerError, Result};

/// Caller-tunable knobs; unset values fall back to configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOptions {
    pub num_days: usize,
    pub max_trail_search_radius_km: Option<f64>,
    pub profile: Option<String>,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            num_days: 1,
            max_trail_search_radius_km: None,
            profile: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResult {
    pub route: Route,
    pub daily_segments: Vec<DaySegment>,
    pub stats: RouteStats,
    pub elevation_available: bool,
    /// Non-fatal degradations, such as missing elevation batches
    pub warnings: Vec<String>,
}

pub struct Planner {
    validator: GeoValidator,
    chain: Arc<ProviderChain>,
    routes: RouteCache,
    annotator: ElevationAnnotator,
    stats: StatsEngine,
    segmenter: DaySegmenter,
    default_profile: String,
    default_radius_km: f64,
    max_days: usize,
}

impl Planner {
    /// Assemble a planner around an existing provider chain and elevation backend
    pub fn new(
        config: &PlannerConfig,
        chain: ProviderChain,
        elevation: Arc<dyn ElevationBackend>,
    ) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.cache.capacity)
            .ok_or_else(|| PlannerError::config("cache.capacity must be at least 1"))?;
        let stats = StatsEngine::new(config.stats.clone());

        Ok(Self {
            validator: GeoValidator::new(config.region.bounding_box()),
            chain: Arc::new(chain),
            routes: RouteCache::new(capacity, config.cache.route_ttl()),
            annotator: ElevationAnnotator::new(
                elevation,
                config.elevation.batch_size,
                capacity,
                config.cache.elevation_ttl(),
            ),
            segmenter: DaySegmenter::new(stats.clone()),
            stats,
            default_profile: config.routing.profile.clone(),
            default_radius_km: config.trails.max_search_radius_km,
            max_days: config.planning.max_days,
        })
    }

    /// Build the production pipeline: Overpass trails, local and public OSRM,
    /// Open-Elevation
    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        let retries = config.routing.max_retries;
        let trail_client = build_client(config.trails.timeout(), retries)?;
        let routing_client = build_client(config.routing.timeout(), retries)?;
        let elevation_client = build_client(config.elevation.timeout(), retries)?;

        let index = Arc::new(OverpassTrailIndex::new(
            trail_client,
            config.trails.overpass_url.clone(),
            config.trails.bbox_padding_deg,
            config.trails.timeout(),
        ));
        let chain = ProviderChain::new(
            Arc::new(TrailNetworkProvider::new(
                index,
                config.stats.walking_speed_kmh,
            )),
            Arc::new(OsrmProvider::local(
                routing_client.clone(),
                config.routing.local_url.clone(),
            )),
            Arc::new(OsrmProvider::public(
                routing_client,
                config.routing.public_url.clone(),
            )),
        );
        let elevation = Arc::new(OpenElevationBackend::new(
            elevation_client,
            config.elevation.url.clone(),
        ));

        Self::new(config, chain, elevation)
    }

    #[must_use]
    pub fn validator(&self) -> &GeoValidator {
        &self.validator
    }

    #[instrument(skip_all, fields(waypoints = waypoints.len(), days = options.num_days))]
    pub async fn resolve_route(
        &self,
        waypoints: &[Waypoint],
        options: &RouteOptions,
    ) -> Result<PlanResult> {
        let request = self.validate(waypoints, options)?;
        let route = self.obtain_route(request).await?;
        let annotation = self.annotator.annotate(&route.geometry).await;

        let mut warnings = Vec::new();
        let status = match annotation.partial_failure() {
            None => ElevationStatus::Complete,
            Some(degraded) => {
                warn!("{}", degraded);
                warnings.push(degraded.user_message());
                ElevationStatus::Unavailable
            }
        };

        let (route, stats) = self.finalize(&route, annotation, status);
        let daily_segments = self.segmenter.split(&route, options.num_days, status)?;

        info!(
            "Resolved {:.1} km route via {} in {} days",
            route.distance_meters / 1000.0,
            route.source.as_str(),
            daily_segments.len()
        );
        Ok(PlanResult {
            route,
            daily_segments,
            stats,
            elevation_available: status == ElevationStatus::Complete,
            warnings,
        })
    }

    fn validate(&self, waypoints: &[Waypoint], options: &RouteOptions) -> Result<RouteRequest> {
        if waypoints.len() < 2 {
            return Err(PlannerError::invalid_request(format!(
                "at least 2 waypoints are required, got {}",
                waypoints.len()
            )));
        }
        if options.num_days == 0 || options.num_days > self.max_days {
            return Err(PlannerError::invalid_request(format!(
                "num_days must be between 1 and {}, got {}",
                self.max_days, options.num_days
            )));
        }
        let radius = options
            .max_trail_search_radius_km
            .unwrap_or(self.default_radius_km);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PlannerError::invalid_request(
                "max_trail_search_radius_km must be positive",
            ));
        }

        let points = waypoints
            .iter()
            .map(|w| {
                let point = GeoValidator::normalize_lat_lon(w.point.lat, w.point.lon)?;
                self.validator.ensure_in_region(&point)?;
                Ok::<_, PlannerError>(point)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RouteRequest {
            waypoints: points,
            profile: options
                .profile
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| self.default_profile.clone()),
            max_trail_search_radius_km: radius,
        })
    }

    async fn obtain_route(&self, request: RouteRequest) -> Result<Arc<Route>> {
        let key = RouteKey::new(&request.waypoints, &request.profile);
        let chain = Arc::clone(&self.chain);
        self.routes
            .get_or_resolve(key, move || async move { chain.resolve(&request).await })
            .await
    }

    /// Build the returned route in one step from annotated geometry
    fn finalize(
        &self,
        route: &Route,
        annotation: Annotation,
        status: ElevationStatus,
    ) -> (Route, RouteStats) {
        let stats = self.stats.compute(&annotation.points, status);
        let finalized = Route {
            geometry: annotation.points,
            distance_meters: stats.distance_meters,
            duration_seconds: stats.duration_seconds,
            ascent: stats.ascent.unwrap_or(0.0),
            descent: stats.descent.unwrap_or(0.0),
            source: route.source,
        };
        (finalized, stats)
    }

    pub fn clear_caches(&self) {
        self.routes.clear();
        self.annotator.clear_cache();
    }

    #[must_use]
    pub fn cached_routes(&self) -> usize {
        self.routes.len()
    }
}
