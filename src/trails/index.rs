//! Overpass API integration.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::geo::GeoValidator;
use crate::models::{BoundingBox, NetworkTier, Point, Trail};
use crate::{PlannerError, Result};

/// Source of marked-trail geometry for a bounding box
#[async_trait]
pub trait TrailIndex: Send + Sync {
    /// Fetch all trails intersecting `bbox`.
    ///
    /// Failures are reported as [`PlannerError::TrailFetch`]; callers treat
    /// them as "no marked trails available".
    async fn fetch_trails(&self, bbox: &BoundingBox) -> Result<Vec<Trail>>;
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    element_type: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    nodes: Vec<i64>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Classify a way by its network tags.
///
/// `ref=INT` or `network=iwn` and `network=nwn` are national,
/// `network=rwn` regional, `network=lwn` and visibly marked paths local.
#[must_use]
pub fn classify_tier(tags: &HashMap<String, String>) -> NetworkTier {
    let tag = |k: &str| tags.get(k).map(String::as_str);

    if tag("ref") == Some("INT") {
        return NetworkTier::National;
    }
    match tag("network") {
        Some("iwn" | "nwn") => return NetworkTier::National,
        Some("rwn") => return NetworkTier::Regional,
        Some("lwn") => return NetworkTier::Local,
        _ => {}
    }

    let marked_path = matches!(tag("highway"), Some("path" | "footway"));
    let visible = matches!(
        tag("trail_visibility"),
        Some("excellent" | "good" | "intermediate")
    );
    if marked_path && visible {
        NetworkTier::Local
    } else {
        NetworkTier::Unmarked
    }
}

/// Trail index querying an Overpass interpreter
pub struct OverpassTrailIndex {
    client: ClientWithMiddleware,
    overpass_url: String,
    padding_deg: f64,
    timeout: Duration,
}

impl OverpassTrailIndex {
    /// `timeout` bounds both the HTTP client and the server-side query
    #[must_use]
    pub fn new(
        client: ClientWithMiddleware,
        overpass_url: String,
        padding_deg: f64,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            overpass_url,
            padding_deg,
            timeout,
        }
    }

    fn build_query(&self, bbox: &BoundingBox) -> String {
        let b = format!(
            "({},{},{},{})",
            bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon
        );
        let timeout = self.timeout.as_secs().max(1);
        format!(
            "[out:json][timeout:{timeout}];(\
way[\"highway\"=\"path\"][\"trail_visibility\"~\"excellent|good|intermediate\"]{b};\
way[\"highway\"=\"footway\"][\"trail_visibility\"~\"excellent|good|intermediate\"]{b};\
way[\"route\"=\"hiking\"][\"ref\"=\"INT\"]{b};\
way[\"route\"=\"hiking\"][\"network\"=\"iwn\"]{b};\
way[\"route\"=\"hiking\"][\"network\"=\"nwn\"]{b};\
way[\"route\"=\"hiking\"][\"network\"=\"rwn\"]{b};\
);out body;>;out skel qt;"
        )
    }

    fn parse_trails(response: OverpassResponse) -> Vec<Trail> {
        let mut nodes: HashMap<i64, Point> = HashMap::new();
        let mut ways = Vec::new();

        for element in response.elements {
            match element.element_type.as_str() {
                "node" => {
                    if let (Some(lat), Some(lon)) = (element.lat, element.lon) {
                        match GeoValidator::normalize_lat_lon(lat, lon) {
                            Ok(point) => {
                                nodes.insert(element.id, point);
                            }
                            Err(e) => debug!("Skipping node {}: {}", element.id, e),
                        }
                    }
                }
                "way" => ways.push(element),
                _ => {}
            }
        }

        let mut discarded = 0;
        let trails: Vec<Trail> = ways
            .into_iter()
            .filter_map(|way| {
                let geometry: Vec<Point> = way
                    .nodes
                    .iter()
                    .filter_map(|id| nodes.get(id).copied())
                    .collect();
                if geometry.len() < 2 {
                    discarded += 1;
                    return None;
                }
                Some(Trail {
                    id: way.id,
                    name: way
                        .tags
                        .get("name")
                        .cloned()
                        .unwrap_or_else(|| format!("Trail {}", way.id)),
                    network_tier: classify_tier(&way.tags),
                    difficulty_tag: way
                        .tags
                        .get("sac_scale")
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string()),
                    geometry,
                })
            })
            .collect();

        if discarded > 0 {
            debug!("Discarded {} ways with fewer than 2 resolved nodes", discarded);
        }
        trails
    }
}

#[async_trait]
impl TrailIndex for OverpassTrailIndex {
    #[instrument(skip(self))]
    async fn fetch_trails(&self, bbox: &BoundingBox) -> Result<Vec<Trail>> {
        let padded = bbox.padded(self.padding_deg);
        let query = self.build_query(&padded);
        debug!("Overpass query: {}", query);

        let response = self
            .client
            .post(&self.overpass_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(format!("data={}", urlencoding::encode(&query)))
            .send()
            .await
            .map_err(|e| PlannerError::trail_fetch(format!("overpass request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Overpass returned HTTP {}", status);
            return Err(PlannerError::trail_fetch(format!(
                "overpass request failed with status {status}"
            )));
        }

        let data: OverpassResponse = response.json().await.map_err(|e| {
            PlannerError::trail_fetch(format!("overpass response parse failed: {e}"))
        })?;

        let trails = Self::parse_trails(data);
        info!("Fetched {} marked trails", trails.len());
        Ok(trails)
    }
}
