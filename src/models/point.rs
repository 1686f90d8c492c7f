//! Point model for geographic coordinates

use serde::{Deserialize, Serialize};

/// Canonical coordinate representation.
///
/// Values crossing the system boundary are built through
/// [`crate::geo::GeoValidator`]; `Point::new` is for geometry that is
/// already known to be valid (engine responses, projections).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Point {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Elevation in meters, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

impl Point {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            elevation: None,
        }
    }

    #[must_use]
    pub fn with_elevation(self, elevation: Option<f64>) -> Self {
        Self { elevation, ..self }
    }

    /// Whether both axes are finite and inside the WGS84 ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (i64, i64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(5));
        (
            (self.lat * multiplier).round() as i64,
            (self.lon * multiplier).round() as i64,
        )
    }

    /// Format as "lat, lon" with 5 decimals
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.5}, {:.5}", self.lat, self.lon)
    }
}

/// Axis-aligned geographic box
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Smallest box spanning all points, `None` for an empty slice
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = Self::new(first.lat, first.lon, first.lat, first.lon);
        Some(points.iter().skip(1).fold(init, |acc, p| Self {
            min_lat: acc.min_lat.min(p.lat),
            min_lon: acc.min_lon.min(p.lon),
            max_lat: acc.max_lat.max(p.lat),
            max_lon: acc.max_lon.max(p.lon),
        }))
    }

    /// Grow every side by `margin_deg`, clamped to valid coordinate ranges
    #[must_use]
    pub fn padded(&self, margin_deg: f64) -> Self {
        Self {
            min_lat: (self.min_lat - margin_deg).max(-90.0),
            min_lon: (self.min_lon - margin_deg).max(-180.0),
            max_lat: (self.max_lat + margin_deg).min(90.0),
            max_lon: (self.max_lon + margin_deg).min(180.0),
        }
    }

    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_rounded_coordinates() {
        let point = Point::new(31.778_234_9, 35.225_456_1);
        assert_eq!(point.rounded_coordinates(5), (3_177_823, 3_522_546));
    }

    #[test]
    fn test_point_validity() {
        assert!(Point::new(31.78, 35.22).is_valid());
        assert!(!Point::new(91.0, 35.22).is_valid());
        assert!(!Point::new(31.78, f64::NAN).is_valid());
    }

    #[test]
    fn test_bounding_box_from_points_and_padding() {
        let bbox = BoundingBox::from_points(&[Point::new(31.78, 35.22), Point::new(31.70, 35.40)])
            .unwrap();
        assert_eq!(bbox, BoundingBox::new(31.70, 35.22, 31.78, 35.40));

        let padded = bbox.padded(0.1);
        assert!((padded.min_lat - 31.60).abs() < 1e-9);
        assert!((padded.max_lon - 35.50).abs() < 1e-9);
        assert!(padded.contains(&Point::new(31.65, 35.45)));
        assert!(!bbox.contains(&Point::new(31.65, 35.45)));
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(BoundingBox::from_points(&[]).is_none());
    }
}
