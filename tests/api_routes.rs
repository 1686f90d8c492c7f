//! HTTP surface tests driven through the router without a socket

mod common;

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::{Providers, SlopeElevation, line, planner};
use hikeplanner::api::AppState;
use hikeplanner::geocoding::LocationSearch;
use hikeplanner::http::build_client;
use hikeplanner::{Point, RouteSource, web};
use rstest::rstest;
use serde_json::{Value, json};
use tower::ServiceExt;

fn state(providers: &Providers) -> AppState {
    let search = LocationSearch::new(
        build_client(Duration::from_secs(1), 0).unwrap(),
        "http://127.0.0.1:9/v1/search".to_string(),
        5,
        NonZeroUsize::new(4).unwrap(),
        Duration::from_secs(60),
    );
    AppState {
        planner: Arc::new(planner(providers, SlopeElevation { fail_batches: false })),
        search: Arc::new(search),
    }
}

async fn call(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = web::app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_route(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/route")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn route_endpoint_returns_plan() {
    let geometry = line(Point::new(31.78, 35.22), Point::new(31.70, 35.40), 20);
    let providers = Providers::new(&[RouteSource::LocalEngine], geometry, Duration::ZERO);

    let (status, body) = call(
        state(&providers),
        post_route(json!({
            "waypoints": [
                {"lat": 31.78, "lng": 35.22, "label": "Jerusalem"},
                {"lat": 31.70, "lon": 35.40}
            ],
            "num_days": 2
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["route"]["source"], "local-engine");
    assert_eq!(body["elevation_available"], true);
    let days = body["daily_segments"].as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["day_index"], 1);
    assert_eq!(days[1]["day_index"], 2);
}

#[tokio::test]
async fn out_of_region_is_bad_request() {
    let providers = Providers::new(&[RouteSource::LocalEngine], vec![], Duration::ZERO);

    let (status, body) = call(
        state(&providers),
        post_route(json!({
            "waypoints": [{"lat": 31.78, "lon": 35.22}, {"lat": 40.0, "lon": 35.2}]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "out_of_region");
    assert!(body["message"].as_str().unwrap().contains("outside"));
}

#[rstest]
#[case::past_configured_limit(json!(31))]
#[case::billion(json!(1_000_000_000_u64))]
#[case::usize_max(json!(u64::MAX))]
#[tokio::test]
async fn oversized_itinerary_is_bad_request(#[case] num_days: Value) {
    let geometry = line(Point::new(31.78, 35.22), Point::new(31.70, 35.40), 20);
    let providers = Providers::new(&[RouteSource::LocalEngine], geometry, Duration::ZERO);

    let (status, body) = call(
        state(&providers),
        post_route(json!({
            "waypoints": [{"lat": 31.78, "lon": 35.22}, {"lat": 31.70, "lon": 35.40}],
            "num_days": num_days
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    assert_eq!(providers.total_calls(), 0);
}

#[tokio::test]
async fn exhausted_providers_is_not_found() {
    let providers = Providers::new(&[], vec![], Duration::ZERO);

    let (status, body) = call(
        state(&providers),
        post_route(json!({
            "waypoints": [{"lat": 31.78, "lon": 35.22}, {"lat": 31.70, "lon": 35.40}]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no_route_found");
}

#[tokio::test]
async fn blank_search_returns_empty_list() {
    let providers = Providers::new(&[], vec![], Duration::ZERO);
    let request = Request::builder()
        .uri("/api/locations/search?query=%20%20")
        .body(Body::empty())
        .unwrap();

    let (status, body) = call(state(&providers), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn health_reports_version() {
    let providers = Providers::new(&[], vec![], Duration::ZERO);
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = call(state(&providers), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], hikeplanner::VERSION);
}
