use serde::{Deserialize, Serialize};

use super::Point;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WaypointRole {
    Start,
    Waypoint,
    End,
}

/// Ordered location a route must pass through
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Waypoint {
    pub point: Point,
    pub label: Option<String>,
    pub role: WaypointRole,
}

impl Waypoint {
    /// Build an ordered waypoint list; roles follow position (first = start, last = end).
    #[must_use]
    pub fn sequence<I>(stops: I) -> Vec<Waypoint>
    where
        I: IntoIterator<Item = (Point, Option<String>)>,
    {
        let stops: Vec<_> = stops.into_iter().collect();
        let last = stops.len().saturating_sub(1);
        stops
            .into_iter()
            .enumerate()
            .map(|(i, (point, label))| Waypoint {
                point,
                label,
                role: match i {
                    0 => WaypointRole::Start,
                    i if i == last => WaypointRole::End,
                    _ => WaypointRole::Waypoint,
                },
            })
            .collect()
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.point.format_coordinates())
    }
}
