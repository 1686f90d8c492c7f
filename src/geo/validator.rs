//! Coordinate validation and normalization
//!
//! Every external coordinate shape (`[a, b]` arrays, `{lat, lng}`,
//! `{lat, lon}`, `{latitude, longitude}`) is converted to [`Point`] here and
//! nowhere else. Axis order is never guessed: an array is only accepted
//! without an explicit [`AxisOrder`] when exactly one reading is in range.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{BoundingBox, Point};
use crate::{PlannerError, Result};

/// Axis order of a two-element coordinate array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrder {
    /// `[lat, lon]`
    LatLon,
    /// `[lon, lat]`, the GeoJSON order
    LonLat,
}

/// Whether `point` lies inside `bbox` (edges inclusive)
#[must_use]
pub fn is_in_region(point: &Point, bbox: &BoundingBox) -> bool {
    bbox.contains(point)
}

/// Validates raw coordinates and enforces the supported region
#[derive(Debug, Clone)]
pub struct GeoValidator {
    region: BoundingBox,
}

impl GeoValidator {
    #[must_use]
    pub fn new(region: BoundingBox) -> Self {
        Self { region }
    }

    #[must_use]
    pub fn region(&self) -> &BoundingBox {
        &self.region
    }

    /// Convert any supported external shape to a [`Point`]
    pub fn normalize(&self, raw: &Value, order: Option<AxisOrder>) -> Result<Point> {
        match raw {
            Value::Array(values) => Self::normalize_array(values, order),
            Value::Object(fields) => Self::normalize_object(fields),
            other => Err(PlannerError::invalid_coordinates(format!(
                "unsupported coordinate shape: {other}"
            ))),
        }
    }

    /// Validate an explicit latitude/longitude pair
    pub fn normalize_lat_lon(lat: f64, lon: f64) -> Result<Point> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(PlannerError::invalid_coordinates(
                "coordinates must be finite numbers",
            ));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(PlannerError::invalid_coordinates(format!(
                "latitude must be between -90 and 90, got: {lat}"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(PlannerError::invalid_coordinates(format!(
                "longitude must be between -180 and 180, got: {lon}"
            )));
        }
        Ok(Point::new(lat, lon))
    }

    /// Normalize and then require membership in the supported region
    pub fn normalize_in_region(&self, raw: &Value, order: Option<AxisOrder>) -> Result<Point> {
        let point = self.normalize(raw, order)?;
        self.ensure_in_region(&point)?;
        Ok(point)
    }

    pub fn ensure_in_region(&self, point: &Point) -> Result<()> {
        if is_in_region(point, &self.region) {
            Ok(())
        } else {
            Err(PlannerError::out_of_region(format!(
                "({}) is outside ({}, {}) - ({}, {})",
                point.format_coordinates(),
                self.region.min_lat,
                self.region.min_lon,
                self.region.max_lat,
                self.region.max_lon
            )))
        }
    }

    #[must_use]
    pub fn is_in_region(&self, point: &Point) -> bool {
        is_in_region(point, &self.region)
    }

    fn normalize_array(values: &[Value], order: Option<AxisOrder>) -> Result<Point> {
        if values.len() != 2 {
            return Err(PlannerError::invalid_coordinates(format!(
                "coordinate array must have exactly 2 elements, got {}",
                values.len()
            )));
        }
        let first = number(&values[0], "first coordinate")?;
        let second = number(&values[1], "second coordinate")?;

        match order {
            Some(AxisOrder::LatLon) => Self::normalize_lat_lon(first, second),
            Some(AxisOrder::LonLat) => Self::normalize_lat_lon(second, first),
            None => {
                let as_lat_lon = Self::normalize_lat_lon(first, second);
                let as_lon_lat = Self::normalize_lat_lon(second, first);
                match (as_lat_lon, as_lon_lat) {
                    (Ok(_), Ok(_)) => Err(PlannerError::invalid_coordinates(format!(
                        "ambiguous axis order for [{first}, {second}]; specify lat/lon order explicitly"
                    ))),
                    (Ok(point), Err(_)) | (Err(_), Ok(point)) => {
                        debug!("Resolved unambiguous coordinate array to {:?}", point);
                        Ok(point)
                    }
                    (Err(e), Err(_)) => Err(e),
                }
            }
        }
    }

    fn normalize_object(fields: &Map<String, Value>) -> Result<Point> {
        let lat = axis_field(fields, &["lat", "latitude"], "latitude")?;
        let lon = axis_field(fields, &["lon", "lng", "longitude"], "longitude")?;

        let point = Self::normalize_lat_lon(lat, lon)?;
        let elevation = match fields.get("elevation") {
            None | Some(Value::Null) => None,
            Some(v) => Some(number(v, "elevation")?),
        };
        Ok(point.with_elevation(elevation))
    }
}

/// Read one axis from any of its accepted keys; aliases must agree
fn axis_field(fields: &Map<String, Value>, keys: &[&str], what: &str) -> Result<f64> {
    let values = keys
        .iter()
        .filter_map(|k| fields.get(*k))
        .map(|v| number(v, what))
        .collect::<Result<Vec<f64>>>()?;

    match values.as_slice() {
        [] => Err(PlannerError::invalid_coordinates(format!(
            "missing {what} field"
        ))),
        [first, rest @ ..] if rest.iter().any(|v| v != first) => Err(
            PlannerError::invalid_coordinates(format!("conflicting {what} fields")),
        ),
        [first, ..] => Ok(*first),
    }
}

fn number(value: &Value, what: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| PlannerError::invalid_coordinates(format!("{what} is not numeric: {value}")))
}
