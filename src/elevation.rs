//! Elevation annotation of route geometry.
//!
//! Geometry is split into fixed-size batches that are looked up in order.
//! A failed batch leaves its points without elevation instead of failing the
//! whole route, and the result records how many batches were lost.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cache::TtlCache;
use crate::models::Point;
use crate::{PlannerError, Result};

/// Coordinates are shared between batches at this many decimals
const KEY_PRECISION: u32 = 5;

/// Elevation lookup for one batch, results in input order
#[async_trait]
pub trait ElevationBackend: Send + Sync {
    async fn lookup(&self, batch: &[Point]) -> Result<Vec<Option<f64>>>;
}

#[derive(Debug, Serialize)]
struct LookupRequest {
    locations: Vec<LookupLocation>,
}

#[derive(Debug, Serialize)]
struct LookupLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    elevation: Option<f64>,
}

/// Open-Elevation compatible `POST /api/v1/lookup` client
pub struct OpenElevationBackend {
    client: ClientWithMiddleware,
    url: String,
}

impl OpenElevationBackend {
    #[must_use]
    pub fn new(client: ClientWithMiddleware, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl ElevationBackend for OpenElevationBackend {
    async fn lookup(&self, batch: &[Point]) -> Result<Vec<Option<f64>>> {
        let request = LookupRequest {
            locations: batch
                .iter()
                .map(|p| LookupLocation {
                    latitude: p.lat,
                    longitude: p.lon,
                })
                .collect(),
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| PlannerError::elevation_partial(format!("encoding request: {e}")))?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| PlannerError::elevation_partial(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PlannerError::elevation_partial(format!(
                "lookup failed with status {}",
                response.status()
            )));
        }

        let data: LookupResponse = response
            .json()
            .await
            .map_err(|e| PlannerError::elevation_partial(format!("parsing response: {e}")))?;

        Ok(data
            .results
            .into_iter()
            .map(|r| r.elevation.filter(|e| e.is_finite()))
            .collect())
    }
}

/// Geometry with elevation attached where it could be resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub points: Vec<Point>,
    pub total_batches: usize,
    pub failed_batches: usize,
}

impl Annotation {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_batches == 0
    }

    /// Degradation warning when any batch was lost
    #[must_use]
    pub fn partial_failure(&self) -> Option<PlannerError> {
        (!self.is_complete()).then(|| {
            PlannerError::elevation_partial(format!(
                "{} of {} elevation batches failed",
                self.failed_batches, self.total_batches
            ))
        })
    }
}

type BatchKey = Vec<(i64, i64)>;

pub struct ElevationAnnotator {
    backend: Arc<dyn ElevationBackend>,
    batch_size: usize,
    cache: TtlCache<BatchKey, Arc<Vec<Option<f64>>>>,
}

impl ElevationAnnotator {
    #[must_use]
    pub fn new(
        backend: Arc<dyn ElevationBackend>,
        batch_size: usize,
        cache_capacity: NonZeroUsize,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            backend,
            batch_size: batch_size.max(1),
            cache: TtlCache::new("elevation", cache_capacity, cache_ttl),
        }
    }

    #[instrument(skip_all, fields(points = geometry.len()))]
    pub async fn annotate(&self, geometry: &[Point]) -> Annotation {
        let mut points = Vec::with_capacity(geometry.len());
        let mut total_batches = 0;
        let mut failed_batches = 0;

        for (index, batch) in geometry.chunks(self.batch_size).enumerate() {
            total_batches += 1;
            match self.lookup_batch(batch).await {
                Ok(elevations) => points.extend(
                    batch
                        .iter()
                        .zip(elevations.iter())
                        .map(|(p, e)| p.with_elevation(*e)),
                ),
                Err(e) => {
                    warn!("Elevation batch {} failed: {}", index, e);
                    failed_batches += 1;
                    points.extend(batch.iter().map(|p| p.with_elevation(None)));
                }
            }
        }

        debug!(
            "Annotated {} points in {} batches ({} failed)",
            points.len(),
            total_batches,
            failed_batches
        );
        Annotation {
            points,
            total_batches,
            failed_batches,
        }
    }

    async fn lookup_batch(&self, batch: &[Point]) -> Result<Arc<Vec<Option<f64>>>> {
        let key: BatchKey = batch
            .iter()
            .map(|p| p.rounded_coordinates(KEY_PRECISION))
            .collect();
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let elevations = self.backend.lookup(batch).await?;
        if elevations.len() != batch.len() {
            return Err(PlannerError::elevation_partial(format!(
                "expected {} results, got {}",
                batch.len(),
                elevations.len()
            )));
        }

        let elevations = Arc::new(elevations);
        self.cache.put(key, Arc::clone(&elevations));
        Ok(elevations)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_client;
    use crate::test_support::spawn_stub;
    use axum::{Json, Router, routing::post};
    use serde_json::{Value, json};
    use std::sync::Mutex;

    /// Returns `lat * 100` as elevation and records batch sizes
    struct RecordingBackend {
        batches: Mutex<Vec<usize>>,
        fail_on_call: Option<usize>,
    }

    impl RecordingBackend {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail_on_call,
            }
        }
    }

    #[async_trait]
    impl ElevationBackend for RecordingBackend {
        async fn lookup(&self, batch: &[Point]) -> Result<Vec<Option<f64>>> {
            let call = {
                let mut batches = self.batches.lock().unwrap();
                batches.push(batch.len());
                batches.len() - 1
            };
            if self.fail_on_call == Some(call) {
                return Err(PlannerError::elevation_partial("backend down"));
            }
            Ok(batch.iter().map(|p| Some(p.lat * 100.0)).collect())
        }
    }

    fn geometry(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| Point::new(31.0 + i as f64 * 0.0001, 35.0))
            .collect()
    }

    fn annotator(backend: Arc<RecordingBackend>) -> ElevationAnnotator {
        ElevationAnnotator::new(
            backend,
            100,
            NonZeroUsize::new(16).unwrap(),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_batches_issued_in_order() {
        let backend = Arc::new(RecordingBackend::new(None));
        let result = annotator(backend.clone()).annotate(&geometry(250)).await;

        assert_eq!(*backend.batches.lock().unwrap(), vec![100, 100, 50]);
        assert_eq!(result.points.len(), 250);
        assert_eq!(result.total_batches, 3);
        assert!(result.is_complete());
        assert!(result.partial_failure().is_none());
        for (annotated, original) in result.points.iter().zip(geometry(250)) {
            assert_eq!(annotated.lat, original.lat);
            assert_eq!(annotated.elevation, Some(original.lat * 100.0));
        }
    }

    #[tokio::test]
    async fn test_failed_batch_degrades_only_its_points() {
        let backend = Arc::new(RecordingBackend::new(Some(1)));
        let result = annotator(backend).annotate(&geometry(250)).await;

        assert_eq!(result.failed_batches, 1);
        assert!(result.points[..100].iter().all(|p| p.elevation.is_some()));
        assert!(result.points[100..200].iter().all(|p| p.elevation.is_none()));
        assert!(result.points[200..].iter().all(|p| p.elevation.is_some()));
        assert!(matches!(
            result.partial_failure(),
            Some(PlannerError::ElevationPartialFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_repeated_batches_hit_cache() {
        let backend = Arc::new(RecordingBackend::new(None));
        let annotator = annotator(backend.clone());
        annotator.annotate(&geometry(150)).await;
        annotator.annotate(&geometry(150)).await;
        assert_eq!(backend.batches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_is_not_cached() {
        let backend = Arc::new(RecordingBackend::new(Some(0)));
        let annotator = annotator(backend.clone());
        let first = annotator.annotate(&geometry(10)).await;
        let second = annotator.annotate(&geometry(10)).await;
        assert!(!first.is_complete());
        assert!(second.is_complete());
        assert_eq!(backend.batches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_open_elevation_wire_format() {
        let router = Router::new().route(
            "/api/v1/lookup",
            post(|Json(body): Json<Value>| async move {
                let locations = body["locations"].as_array().cloned().unwrap_or_default();
                assert_eq!(locations[0]["latitude"], json!(31.78));
                assert_eq!(locations[0]["longitude"], json!(35.22));
                Json(json!({
                    "results": [
                        {"latitude": 31.78, "longitude": 35.22, "elevation": 754.0},
                        {"latitude": 31.70, "longitude": 35.40, "elevation": null}
                    ]
                }))
            }),
        );
        let base = spawn_stub(router).await;

        let backend = OpenElevationBackend::new(
            build_client(Duration::from_secs(5), 0).unwrap(),
            format!("{base}/api/v1/lookup"),
        );
        let elevations = backend
            .lookup(&[Point::new(31.78, 35.22), Point::new(31.70, 35.40)])
            .await
            .unwrap();
        assert_eq!(elevations, vec![Some(754.0), None]);
    }
}
