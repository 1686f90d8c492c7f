//! Splitting a route into daily stages of roughly equal distance.

use tracing::debug;

use crate::geo::distance_meters;
use crate::models::{DaySegment, Point, Route};
use crate::stats::{ElevationStatus, StatsEngine};
use crate::{PlannerError, Result};

/// Upper bound on itinerary length accepted by [`DaySegmenter::split`]
pub const MAX_DAYS: usize = 365;

#[derive(Debug, Clone)]
pub struct DaySegmenter {
    stats: StatsEngine,
}

impl DaySegmenter {
    #[must_use]
    pub fn new(stats: StatsEngine) -> Self {
        Self { stats }
    }

    /// Split `route` into exactly `num_days` contiguous segments.
    ///
    /// Consecutive segments share their junction point. A day is closed once
    /// the next edge would carry it past the per-day target distance, or when
    /// the remaining edges are only just enough to give every later day one.
    /// Routes with fewer edges than days end with single-point rest days.
    pub fn split(
        &self,
        route: &Route,
        num_days: usize,
        elevation: ElevationStatus,
    ) -> Result<Vec<DaySegment>> {
        if !(1..=MAX_DAYS).contains(&num_days) {
            return Err(PlannerError::invalid_request(format!(
                "num_days must be between 1 and {MAX_DAYS}, got {num_days}"
            )));
        }
        let Some(first) = route.geometry.first() else {
            return Err(PlannerError::invalid_request("route has no geometry"));
        };

        let geometry = &route.geometry;
        let edge_lengths: Vec<f64> = geometry
            .windows(2)
            .map(|w| distance_meters(&w[0], &w[1]))
            .collect();
        let total: f64 = edge_lengths.iter().sum();
        let target = total / num_days as f64;

        let mut pieces: Vec<Vec<Point>> = Vec::with_capacity(num_days.min(geometry.len()));
        let mut current = vec![*first];
        let mut current_length = 0.0;

        for (i, length) in edge_lengths.iter().enumerate() {
            let days_left_after_current = num_days - 1 - pieces.len();
            let edges_left = edge_lengths.len() - i;
            let has_edge = current.len() > 1;
            let over_target = current_length + length > target;
            let must_yield = edges_left <= days_left_after_current;

            if has_edge && days_left_after_current > 0 && (over_target || must_yield) {
                let junction = geometry[i];
                pieces.push(std::mem::replace(&mut current, vec![junction]));
                current_length = 0.0;
            }
            current.push(geometry[i + 1]);
            current_length += length;
        }
        pieces.push(current);

        while pieces.len() < num_days {
            let rest = geometry.last().copied().unwrap_or(*first);
            pieces.push(vec![rest]);
        }

        debug!(
            "Split {:.0} m into {} days (target {:.0} m/day)",
            total,
            pieces.len(),
            target
        );
        Ok(pieces
            .into_iter()
            .enumerate()
            .map(|(i, piece)| self.segment(i + 1, piece, route, total, num_days, elevation))
            .collect())
    }

    fn segment(
        &self,
        day_index: usize,
        geometry: Vec<Point>,
        route: &Route,
        total_distance: f64,
        num_days: usize,
        elevation: ElevationStatus,
    ) -> DaySegment {
        let stats = self.stats.compute(&geometry, elevation);
        // duration follows the route's own estimate, apportioned by distance
        let share = if total_distance > 0.0 {
            stats.distance_meters / total_distance
        } else {
            1.0 / num_days as f64
        };
        DaySegment {
            day_index,
            distance_meters: stats.distance_meters,
            duration_seconds: route.duration_seconds * share,
            ascent: stats.ascent,
            descent: stats.descent,
            difficulty: stats.difficulty,
            geometry,
        }
    }
}
