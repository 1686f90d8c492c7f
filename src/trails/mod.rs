//! Marked-trail data: fetching, matching and shortest paths
//!
//! - Trail index backed by the Overpass API, with network tier classification
//! - Nearest-trail matching with deterministic tie-breaking
//! - Shortest paths across the trail polyline graph

pub mod graph;
pub mod index;
pub mod matcher;

pub use graph::{Anchor, TrailGraph};
pub use index::{OverpassTrailIndex, TrailIndex, classify_tier};
pub use matcher::{NearestTrailMatcher, TrailMatch};
