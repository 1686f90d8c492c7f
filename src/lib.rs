//! `HikePlanner` - route resolution for multi-day hiking trips
//!
//! This library turns an ordered list of waypoints into a walkable route,
//! preferring marked hiking trails and falling back to road-network routing
//! engines, then annotates elevation, estimates walking time and difficulty,
//! and splits the route into daily stages.

pub mod api;
pub mod cache;
pub mod config;
pub mod elevation;
pub mod error;
pub mod geo;
pub mod geocoding;
pub mod geolocation;
pub mod http;
pub mod models;
pub mod planner;
pub mod routing;
pub mod segmenter;
pub mod stats;
pub mod telemetry;
pub mod trails;
pub mod web;

// Re-export core types for public API
pub use config::PlannerConfig;
pub use error::PlannerError;
pub use geo::{AxisOrder, GeoValidator};
pub use models::{BoundingBox, DaySegment, Difficulty, Point, Route, RouteSource, Waypoint};
pub use planner::{PlanResult, Planner, RouteOptions};
pub use stats::{RouteStats, StatsEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, PlannerError>;
