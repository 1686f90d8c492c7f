//! Nearest marked trail lookup.

use tracing::debug;

use crate::geo::{PolylineProjection, project_on_polyline};
use crate::models::{Point, Trail};

/// Distances closer than this are treated as ties
const TIE_EPSILON_KM: f64 = 1e-9;

/// Result of snapping a point onto a trail
#[derive(Debug, Clone, Copy)]
pub struct TrailMatch<'a> {
    pub trail: &'a Trail,
    pub trail_position: usize,
    pub projection: PolylineProjection,
}

impl TrailMatch<'_> {
    #[must_use]
    pub fn projected_point(&self) -> Point {
        self.projection.point
    }

    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.projection.distance_km
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NearestTrailMatcher;

impl NearestTrailMatcher {
    /// Find the trail closest to `point` within `max_distance_km`.
    ///
    /// Ties resolve to the lower trail id so results do not depend on the
    /// order the index returned trails in.
    #[must_use]
    pub fn nearest<'a>(
        &self,
        point: &Point,
        trails: &'a [Trail],
        max_distance_km: f64,
    ) -> Option<TrailMatch<'a>> {
        let mut best: Option<TrailMatch<'a>> = None;

        for (position, trail) in trails.iter().enumerate() {
            let Some(projection) = project_on_polyline(point, &trail.geometry) else {
                continue;
            };
            if projection.distance_km > max_distance_km {
                continue;
            }

            let replace = match &best {
                None => true,
                Some(current) => {
                    let delta = projection.distance_km - current.distance_km();
                    delta < -TIE_EPSILON_KM
                        || (delta.abs() <= TIE_EPSILON_KM && trail.id < current.trail.id)
                }
            };
            if replace {
                best = Some(TrailMatch {
                    trail,
                    trail_position: position,
                    projection,
                });
            }
        }

        if let Some(found) = &best {
            debug!(
                "Matched ({}) to trail {} at {:.3} km",
                point.format_coordinates(),
                found.trail.id,
                found.distance_km()
            );
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NetworkTier;

    fn trail(id: i64, geometry: Vec<Point>) -> Trail {
        Trail {
            id,
            name: format!("Trail {id}"),
            network_tier: NetworkTier::Local,
            difficulty_tag: "unknown".to_string(),
            geometry,
        }
    }

    #[test]
    fn test_picks_closest_trail() {
        let trails = vec![
            trail(1, vec![Point::new(31.0, 35.0), Point::new(31.0, 35.02)]),
            trail(2, vec![Point::new(31.005, 35.0), Point::new(31.005, 35.02)]),
        ];
        let m = NearestTrailMatcher
            .nearest(&Point::new(31.004, 35.01), &trails, 2.0)
            .unwrap();
        assert_eq!(m.trail.id, 2);
        assert_eq!(m.trail_position, 1);
        assert!((m.projected_point().lat - 31.005).abs() < 1e-9);
    }

    #[test]
    fn test_none_beyond_radius() {
        let trails = vec![trail(1, vec![Point::new(31.0, 35.0), Point::new(31.0, 35.02)])];
        assert!(NearestTrailMatcher
            .nearest(&Point::new(31.1, 35.01), &trails, 2.0)
            .is_none());
    }

    #[test]
    fn test_empty_trail_list() {
        assert!(NearestTrailMatcher
            .nearest(&Point::new(31.0, 35.0), &[], 2.0)
            .is_none());
    }

    #[test]
    fn test_tie_breaks_on_lower_id() {
        let line = vec![Point::new(31.0, 35.0), Point::new(31.0, 35.02)];
        let trails = vec![trail(9, line.clone()), trail(4, line)];
        let m = NearestTrailMatcher
            .nearest(&Point::new(31.001, 35.01), &trails, 2.0)
            .unwrap();
        assert_eq!(m.trail.id, 4);
    }

    #[test]
    fn test_deterministic_across_input_order() {
        let a = trail(3, vec![Point::new(31.0, 35.0), Point::new(31.0, 35.02)]);
        let b = trail(7, vec![Point::new(31.002, 35.0), Point::new(31.002, 35.02)]);
        let p = Point::new(31.001, 35.01);

        let forward = [a.clone(), b.clone()];
        let backward = [b, a];
        let m1 = NearestTrailMatcher.nearest(&p, &forward, 2.0).unwrap();
        let m2 = NearestTrailMatcher.nearest(&p, &backward, 2.0).unwrap();
        assert_eq!(m1.trail.id, m2.trail.id);
    }
}
