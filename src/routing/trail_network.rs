//! Routing over marked hiking trails.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::provider::{RouteProvider, RouteRequest};
use crate::geo::{distance_meters, path_length_meters};
use crate::models::{BoundingBox, Point, Route, RouteSource};
use crate::trails::{Anchor, NearestTrailMatcher, TrailGraph, TrailIndex};
use crate::{PlannerError, Result};

/// Access legs shorter than this are dropped
const MIN_ACCESS_LEG_METERS: f64 = 1.0;

/// First-priority tier: shortest path along marked trails
pub struct TrailNetworkProvider {
    index: Arc<dyn TrailIndex>,
    matcher: NearestTrailMatcher,
    walking_speed_kmh: f64,
}

impl TrailNetworkProvider {
    #[must_use]
    pub fn new(index: Arc<dyn TrailIndex>, walking_speed_kmh: f64) -> Self {
        Self {
            index,
            matcher: NearestTrailMatcher,
            walking_speed_kmh,
        }
    }
}

#[async_trait]
impl RouteProvider for TrailNetworkProvider {
    fn source(&self) -> RouteSource {
        RouteSource::TrailNetwork
    }

    #[instrument(skip(self, request), fields(waypoints = request.waypoints.len()))]
    async fn route(&self, request: &RouteRequest) -> Result<Route> {
        let bbox = BoundingBox::from_points(&request.waypoints)
            .ok_or_else(|| PlannerError::provider_unavailable("no waypoints given"))?;
        let trails = self.index.fetch_trails(&bbox).await?;
        if trails.is_empty() {
            return Err(PlannerError::provider_unavailable(
                "no marked trails in the area",
            ));
        }

        let mut anchors = Vec::with_capacity(request.waypoints.len());
        for (i, waypoint) in request.waypoints.iter().enumerate() {
            let matched = self
                .matcher
                .nearest(waypoint, &trails, request.max_trail_search_radius_km)
                .ok_or_else(|| {
                    PlannerError::provider_unavailable(format!(
                        "no marked trail within {} km of waypoint {}",
                        request.max_trail_search_radius_km,
                        i + 1
                    ))
                })?;
            anchors.push(Anchor {
                trail_position: matched.trail_position,
                segment_index: matched.projection.segment_index,
                t: matched.projection.t,
                point: matched.projected_point(),
            });
        }

        let graph = TrailGraph::build(&trails, &anchors);
        debug!("Trail graph has {} nodes", graph.node_count());
        let on_trail = graph.path_through_anchors().ok_or_else(|| {
            PlannerError::provider_unavailable("waypoints lie on disconnected trails")
        })?;

        let geometry = with_access_legs(&request.waypoints, on_trail);
        if geometry.len() < 2 {
            return Err(PlannerError::provider_unavailable(
                "trail path has no extent",
            ));
        }

        let distance = path_length_meters(&geometry);
        let duration = distance / 1000.0 / self.walking_speed_kmh * 3600.0;
        info!(
            "Trail network route: {:.0} m over {} points",
            distance,
            geometry.len()
        );

        Ok(Route {
            geometry,
            distance_meters: distance,
            duration_seconds: duration,
            ascent: 0.0,
            descent: 0.0,
            source: RouteSource::TrailNetwork,
        })
    }
}

/// Connect the first and last waypoint to where they join the trail
fn with_access_legs(waypoints: &[Point], on_trail: Vec<Point>) -> Vec<Point> {
    let (Some(start), Some(end)) = (waypoints.first(), waypoints.last()) else {
        return on_trail;
    };
    let mut geometry = Vec::with_capacity(on_trail.len() + 2);

    if on_trail
        .first()
        .is_none_or(|first| distance_meters(start, first) >= MIN_ACCESS_LEG_METERS)
    {
        geometry.push(*start);
    }
    geometry.extend(on_trail);
    if geometry
        .last()
        .is_none_or(|last| distance_meters(last, end) >= MIN_ACCESS_LEG_METERS)
    {
        geometry.push(*end);
    }
    geometry
}
