//! Data models for the route planner
//!
//! This module contains the core domain models organized by concern:
//! - Point: canonical coordinates and bounding boxes
//! - Waypoint: ordered route request input
//! - Trail: marked-trail geometry fetched per bounding box
//! - Route: resolved geometry, day segments and difficulty labels

pub mod point;
pub mod route;
pub mod trail;
pub mod waypoint;

// Re-export all public types for convenient access
pub use point::{BoundingBox, Point};
pub use route::{DaySegment, Difficulty, Route, RouteSource};
pub use trail::{NetworkTier, Trail};
pub use waypoint::{Waypoint, WaypointRole};
