//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use hikeplanner::elevation::ElevationBackend;
use hikeplanner::routing::{ProviderChain, RouteProvider, RouteRequest};
use hikeplanner::{Planner, PlannerConfig, PlannerError, Point, Route, RouteSource};

pub type CallLog = Arc<Mutex<Vec<RouteSource>>>;

/// Provider that records each call and answers from a fixed script
pub struct ScriptedProvider {
    pub source: RouteSource,
    pub geometry: Option<Vec<Point>>,
    pub delay: Duration,
    pub calls: AtomicUsize,
    pub log: CallLog,
}

#[async_trait]
impl RouteProvider for ScriptedProvider {
    fn source(&self) -> RouteSource {
        self.source
    }

    async fn route(&self, request: &RouteRequest) -> hikeplanner::Result<Route> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(self.source);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.geometry {
            Some(geometry) => Ok(Route {
                geometry: geometry.clone(),
                distance_meters: 0.0,
                duration_seconds: 0.0,
                ascent: 0.0,
                descent: 0.0,
                source: self.source,
            }),
            None => Err(PlannerError::provider_unavailable(format!(
                "{} down for {} waypoints",
                self.source.as_str(),
                request.waypoints.len()
            ))),
        }
    }
}

pub struct Providers {
    pub trail_network: Arc<ScriptedProvider>,
    pub local_engine: Arc<ScriptedProvider>,
    pub public_engine: Arc<ScriptedProvider>,
    pub log: CallLog,
}

impl Providers {
    /// `succeeding` tiers answer with `geometry`, the others fail
    pub fn new(succeeding: &[RouteSource], geometry: Vec<Point>, delay: Duration) -> Self {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let make = |source: RouteSource| {
            Arc::new(ScriptedProvider {
                source,
                geometry: succeeding.contains(&source).then(|| geometry.clone()),
                delay,
                calls: AtomicUsize::new(0),
                log: Arc::clone(&log),
            })
        };
        Self {
            trail_network: make(RouteSource::TrailNetwork),
            local_engine: make(RouteSource::LocalEngine),
            public_engine: make(RouteSource::PublicEngine),
            log,
        }
    }

    pub fn chain(&self) -> ProviderChain {
        ProviderChain::new(
            self.trail_network.clone(),
            self.local_engine.clone(),
            self.public_engine.clone(),
        )
    }

    pub fn total_calls(&self) -> usize {
        [&self.trail_network, &self.local_engine, &self.public_engine]
            .iter()
            .map(|p| p.calls.load(Ordering::SeqCst))
            .sum()
    }
}

/// Terrain rising 1 m per 0.0001 degrees of longitude east of 35.0
pub struct SlopeElevation {
    pub fail_batches: bool,
}

#[async_trait]
impl ElevationBackend for SlopeElevation {
    async fn lookup(&self, batch: &[Point]) -> hikeplanner::Result<Vec<Option<f64>>> {
        if self.fail_batches {
            return Err(PlannerError::elevation_partial("backend unavailable"));
        }
        Ok(batch
            .iter()
            .map(|p| Some(500.0 + (p.lon - 35.0) * 10_000.0))
            .collect())
    }
}

/// Straight line between two points, split into `steps` edges
pub fn line(from: Point, to: Point, steps: usize) -> Vec<Point> {
    (0..=steps)
        .map(|i| {
            let f = i as f64 / steps as f64;
            Point::new(
                from.lat + (to.lat - from.lat) * f,
                from.lon + (to.lon - from.lon) * f,
            )
        })
        .collect()
}

pub fn planner(providers: &Providers, elevation: SlopeElevation) -> Planner {
    Planner::new(
        &PlannerConfig::default(),
        providers.chain(),
        Arc::new(elevation),
    )
    .unwrap()
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
