use async_trait::async_trait;

use crate::Result;
use crate::models::{Point, Route, RouteSource};

/// Input shared by every provider tier
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    /// Validated waypoints in visiting order, at least two
    pub waypoints: Vec<Point>,
    pub profile: String,
    pub max_trail_search_radius_km: f64,
}

/// One routing tier.
///
/// Implementations either return a complete [`Route`] or an error; a
/// partially built route is never observable.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn source(&self) -> RouteSource;

    async fn route(&self, request: &RouteRequest) -> Result<Route>;
}
