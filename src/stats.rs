//! Distance, walking time, elevation totals and difficulty.

use serde::{Deserialize, Serialize};

use crate::config::StatsConfig;
use crate::geo::path_length_meters;
use crate::models::{Difficulty, Point, Route};

/// Whether elevation on a geometry can be trusted for totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationStatus {
    Complete,
    /// Some lookups failed; totals would be misleading
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStats {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub ascent: Option<f64>,
    pub descent: Option<f64>,
    pub difficulty: Difficulty,
}

/// Sum of positive and negative elevation changes.
///
/// Pairs where either endpoint lacks elevation contribute nothing.
#[must_use]
pub fn elevation_totals(geometry: &[Point]) -> (f64, f64) {
    geometry
        .windows(2)
        .filter_map(|w| Some(w[1].elevation? - w[0].elevation?))
        .fold((0.0, 0.0), |(up, down), delta| {
            if delta > 0.0 {
                (up + delta, down)
            } else {
                (up, down - delta)
            }
        })
}

#[derive(Debug, Clone)]
pub struct StatsEngine {
    config: StatsConfig,
}

impl StatsEngine {
    #[must_use]
    pub fn new(config: StatsConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn compute_stats(&self, route: &Route, elevation: ElevationStatus) -> RouteStats {
        self.compute(&route.geometry, elevation)
    }

    #[must_use]
    pub fn compute(&self, geometry: &[Point], elevation: ElevationStatus) -> RouteStats {
        let distance = path_length_meters(geometry);

        match elevation {
            ElevationStatus::Complete => {
                let (ascent, descent) = elevation_totals(geometry);
                RouteStats {
                    distance_meters: distance,
                    duration_seconds: self.walking_seconds(distance, ascent, descent),
                    ascent: Some(ascent),
                    descent: Some(descent),
                    difficulty: self.difficulty(distance, ascent),
                }
            }
            ElevationStatus::Unavailable => RouteStats {
                distance_meters: distance,
                duration_seconds: self.walking_seconds(distance, 0.0, 0.0),
                ascent: None,
                descent: None,
                difficulty: Difficulty::Unknown,
            },
        }
    }

    /// Naismith-style estimate: flat walking time plus climb and descent penalties
    #[must_use]
    pub fn walking_seconds(&self, distance_meters: f64, ascent: f64, descent: f64) -> f64 {
        let flat_hours = distance_meters / 1000.0 / self.config.walking_speed_kmh;
        let climb_minutes = ascent / 10.0 * self.config.ascent_minutes_per_10m
            + descent / 10.0 * self.config.descent_minutes_per_10m;
        flat_hours * 3600.0 + climb_minutes * 60.0
    }

    #[must_use]
    pub fn difficulty(&self, distance_meters: f64, ascent: f64) -> Difficulty {
        let km = distance_meters / 1000.0;
        let gain_per_km = if km > 0.0 { ascent / km } else { 0.0 };

        if gain_per_km < self.config.easy_max_gain_per_km {
            Difficulty::Easy
        } else if gain_per_km < self.config.moderate_max_gain_per_km {
            Difficulty::Moderate
        } else {
            Difficulty::Hard
        }
    }
}
