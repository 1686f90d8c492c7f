//! Distance and projection computations.
//!
//! Great-circle distances use the haversine formula; projection onto a
//! polyline uses a planar approximation scaled by latitude cosine, which
//! is accurate for the short segments that make up trail geometry.

use haversine::{Location as HaversineLocation, Units, distance};

use crate::models::Point;

/// Great-circle distance in kilometers
#[must_use]
pub fn distance_km(from: &Point, to: &Point) -> f64 {
    let from_haversine = HaversineLocation {
        latitude: from.lat,
        longitude: from.lon,
    };
    let to_haversine = HaversineLocation {
        latitude: to.lat,
        longitude: to.lon,
    };
    distance(from_haversine, to_haversine, Units::Kilometers)
}

/// Great-circle distance in meters
#[must_use]
pub fn distance_meters(from: &Point, to: &Point) -> f64 {
    distance_km(from, to) * 1000.0
}

/// Sum of distances between consecutive points, in meters
#[must_use]
pub fn path_length_meters(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| distance_meters(&w[0], &w[1]))
        .sum()
}

/// Nearest point on a polyline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineProjection {
    pub point: Point,
    /// Index of the segment start vertex
    pub segment_index: usize,
    /// Position along the segment, 0.0 at the start vertex and 1.0 at the end
    pub t: f64,
    pub distance_km: f64,
}

/// Project `position` onto the nearest segment of `line`.
///
/// Returns `None` for lines with fewer than two points. Equal distances
/// keep the earlier segment.
#[must_use]
pub fn project_on_polyline(position: &Point, line: &[Point]) -> Option<PolylineProjection> {
    if line.len() < 2 {
        return None;
    }

    let mut best: Option<PolylineProjection> = None;
    for (i, segment) in line.windows(2).enumerate() {
        let (projected, t) = project_on_segment(position, &segment[0], &segment[1]);
        let dist = distance_km(position, &projected);

        let is_better = match &best {
            Some(prev) => dist < prev.distance_km,
            None => true,
        };
        if is_better {
            best = Some(PolylineProjection {
                point: projected,
                segment_index: i,
                t,
                distance_km: dist,
            });
        }
    }
    best
}

fn project_on_segment(p: &Point, a: &Point, b: &Point) -> (Point, f64) {
    let cos_lat = ((a.lat + b.lat) / 2.0).to_radians().cos();

    let dx = (b.lon - a.lon) * cos_lat;
    let dy = b.lat - a.lat;
    let px = (p.lon - a.lon) * cos_lat;
    let py = p.lat - a.lat;

    let seg_len_sq = dx * dx + dy * dy;
    if seg_len_sq < 1e-20 {
        return (*a, 0.0);
    }

    let t = ((px * dx + py * dy) / seg_len_sq).clamp(0.0, 1.0);
    let elevation = match (a.elevation, b.elevation) {
        (Some(ea), Some(eb)) => Some(ea + t * (eb - ea)),
        _ => None,
    };
    (
        Point::new(a.lat + t * (b.lat - a.lat), a.lon + t * (b.lon - a.lon))
            .with_elevation(elevation),
        t,
    )
}
