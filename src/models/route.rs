use serde::{Deserialize, Serialize};

use super::Point;

/// Which provider tier produced a route
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RouteSource {
    TrailNetwork,
    LocalEngine,
    PublicEngine,
}

impl RouteSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteSource::TrailNetwork => "trail-network",
            RouteSource::LocalEngine => "local-engine",
            RouteSource::PublicEngine => "public-engine",
        }
    }
}

/// Walkable path produced by exactly one provider.
///
/// Shared read-only through the route cache once built.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Route {
    pub geometry: Vec<Point>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub ascent: f64,
    pub descent: f64,
    pub source: RouteSource,
}

/// Qualitative difficulty derived from elevation gain per kilometer
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
    /// Elevation data was incomplete, no label is produced
    Unknown,
}

impl Difficulty {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Hard => "hard",
            Difficulty::Unknown => "unknown",
        }
    }
}

/// Contiguous slice of a route assigned to one day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DaySegment {
    /// 1-based day number
    pub day_index: usize,
    pub geometry: Vec<Point>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub ascent: Option<f64>,
    pub descent: Option<f64>,
    pub difficulty: Difficulty,
}
