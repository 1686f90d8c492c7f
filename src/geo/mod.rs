//! Coordinate validation and planar/great-circle geometry helpers

pub mod distance;
pub mod validator;

pub use distance::{
    PolylineProjection, distance_km, distance_meters, path_length_meters, project_on_polyline,
};
pub use validator::{AxisOrder, GeoValidator, is_in_region};
