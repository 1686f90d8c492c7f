//! OSRM HTTP route service client.
//!
//! The same client serves the local engine and the public fallback; only
//! the base URL and the reported [`RouteSource`] differ.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::provider::{RouteProvider, RouteRequest};
use crate::geo::GeoValidator;
use crate::models::{Point, Route, RouteSource};
use crate::{PlannerError, Result};

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
    duration: f64,
}

/// GeoJSON LineString, coordinates in `[lon, lat]` order
#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

pub struct OsrmProvider {
    client: ClientWithMiddleware,
    base_url: String,
    source: RouteSource,
}

impl OsrmProvider {
    #[must_use]
    pub fn local(client: ClientWithMiddleware, base_url: String) -> Self {
        Self {
            client,
            base_url,
            source: RouteSource::LocalEngine,
        }
    }

    #[must_use]
    pub fn public(client: ClientWithMiddleware, base_url: String) -> Self {
        Self {
            client,
            base_url,
            source: RouteSource::PublicEngine,
        }
    }

    fn route_url(&self, request: &RouteRequest) -> String {
        let coordinates = request
            .waypoints
            .iter()
            .map(|p| format!("{},{}", p.lon, p.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson&steps=false",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&request.profile),
            coordinates
        )
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> PlannerError {
        PlannerError::provider_unavailable(format!("{}: {reason}", self.source.as_str()))
    }

    fn build_route(&self, response: OsrmResponse) -> Result<Route> {
        if response.code != "Ok" {
            return Err(self.unavailable(format!(
                "engine answered {} ({})",
                response.code,
                response.message.unwrap_or_default()
            )));
        }
        let best = response
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| self.unavailable("engine returned no routes"))?;

        let geometry = best
            .geometry
            .coordinates
            .iter()
            .map(|[lon, lat]| GeoValidator::normalize_lat_lon(*lat, *lon))
            .collect::<Result<Vec<Point>>>()
            .map_err(|e| self.unavailable(format!("bad geometry: {e}")))?;
        if geometry.len() < 2 {
            return Err(self.unavailable("route geometry has fewer than 2 points"));
        }

        Ok(Route {
            geometry,
            distance_meters: best.distance,
            duration_seconds: best.duration,
            ascent: 0.0,
            descent: 0.0,
            source: self.source,
        })
    }
}

#[async_trait]
impl RouteProvider for OsrmProvider {
    fn source(&self) -> RouteSource {
        self.source
    }

    #[instrument(skip(self, request), fields(source = self.source.as_str()))]
    async fn route(&self, request: &RouteRequest) -> Result<Route> {
        let url = self.route_url(request);
        debug!("Requesting {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.unavailable(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.unavailable(format!("reading body failed: {e}")))?;
        let parsed = serde_json::from_str::<OsrmResponse>(&body);

        if !status.is_success() {
            // OSRM explains NoRoute and friends in a JSON body
            let detail = match &parsed {
                Ok(error) => format!(
                    "{}: {}",
                    error.code,
                    error.message.as_deref().unwrap_or_default()
                ),
                Err(_) => "no parseable body".to_string(),
            };
            warn!("OSRM answered HTTP {} ({})", status, detail);
            return Err(self.unavailable(format!("HTTP {status}, {detail}")));
        }

        let parsed = parsed.map_err(|e| {
            warn!("Unparseable OSRM response with HTTP {}", status);
            self.unavailable(format!("HTTP {status}, unparseable body: {e}"))
        })?;
        self.build_route(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_client;
    use crate::test_support::spawn_stub;
    use axum::{
        Json, Router,
        extract::Path,
        http::StatusCode,
        routing::get,
    };
    use rstest::rstest;
    use serde_json::json;
    use std::time::Duration;

    fn request() -> RouteRequest {
        RouteRequest {
            waypoints: vec![Point::new(31.78, 35.22), Point::new(31.70, 35.40)],
            profile: "foot".to_string(),
            max_trail_search_radius_km: 2.0,
        }
    }

    fn client() -> ClientWithMiddleware {
        build_client(Duration::from_secs(5), 0).unwrap()
    }

    #[tokio::test]
    async fn test_parses_geojson_in_lon_lat_order() {
        let router = Router::new().route(
            "/route/v1/{profile}/{coords}",
            get(|Path((profile, coords)): Path<(String, String)>| async move {
                assert_eq!(profile, "foot");
                assert_eq!(coords, "35.22,31.78;35.4,31.7");
                Json(json!({
                    "code": "Ok",
                    "routes": [{
                        "geometry": {"type": "LineString", "coordinates": [[35.22, 31.78], [35.3, 31.74], [35.4, 31.7]]},
                        "distance": 19000.5,
                        "duration": 17100.0
                    }]
                }))
            }),
        );
        let base = spawn_stub(router).await;

        let route = OsrmProvider::local(client(), base)
            .route(&request())
            .await
            .unwrap();
        assert_eq!(route.source, RouteSource::LocalEngine);
        assert_eq!(route.geometry.len(), 3);
        assert_eq!(route.geometry[0], Point::new(31.78, 35.22));
        assert_eq!(route.distance_meters, 19000.5);
        assert_eq!(route.duration_seconds, 17100.0);
    }

    #[tokio::test]
    async fn test_no_route_is_unavailable() {
        let router = Router::new().route(
            "/route/v1/{profile}/{coords}",
            get(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"code": "NoRoute", "message": "Impossible route between points"})),
                )
            }),
        );
        let base = spawn_stub(router).await;

        let err = OsrmProvider::public(client(), base)
            .route(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::RouteProviderUnavailable { .. }));
        assert!(err.to_string().contains("NoRoute"));
    }

    #[rstest]
    #[case::forbidden(StatusCode::FORBIDDEN)]
    #[case::overloaded(StatusCode::SERVICE_UNAVAILABLE)]
    #[tokio::test]
    async fn test_error_status_with_ok_body_is_unavailable(#[case] status: StatusCode) {
        let router = Router::new().route(
            "/route/v1/{profile}/{coords}",
            get(move || async move {
                (
                    status,
                    Json(json!({
                        "code": "Ok",
                        "routes": [{
                            "geometry": {"type": "LineString", "coordinates": [[35.22, 31.78], [35.4, 31.7]]},
                            "distance": 19000.0,
                            "duration": 17100.0
                        }]
                    })),
                )
            }),
        );
        let base = spawn_stub(router).await;

        let err = OsrmProvider::local(client(), base)
            .route(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::RouteProviderUnavailable { .. }));
        assert!(err.to_string().contains(status.as_str()));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        // nothing listens on the discard port in the test environment
        let err = OsrmProvider::local(client(), "http://127.0.0.1:9".to_string())
            .route(&request())
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_empty_routes_is_unavailable() {
        let router = Router::new().route(
            "/route/v1/{profile}/{coords}",
            get(|| async { Json(json!({"code": "Ok", "routes": []})) }),
        );
        let base = spawn_stub(router).await;

        let err = OsrmProvider::local(client(), base)
            .route(&request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no routes"));
    }
}
