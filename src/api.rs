//! JSON HTTP surface over the planner and location search.

use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::config::PlannerConfig;
use crate::geo::{AxisOrder, GeoValidator};
use crate::geocoding::{LocationSearch, Place};
use crate::http::build_client;
use crate::models::Waypoint;
use crate::planner::{PlanResult, Planner, RouteOptions};
use crate::{PlannerError, VERSION};

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<Planner>,
    pub search: Arc<LocationSearch>,
}

impl AppState {
    pub fn from_config(config: &PlannerConfig) -> crate::Result<Self> {
        let capacity = NonZeroUsize::new(config.cache.capacity)
            .ok_or_else(|| PlannerError::config("cache.capacity must be at least 1"))?;
        let search = LocationSearch::new(
            build_client(config.geocoding.timeout(), config.routing.max_retries)?,
            config.geocoding.url.clone(),
            config.geocoding.max_results,
            capacity,
            config.cache.search_ttl(),
        );
        Ok(Self {
            planner: Arc::new(Planner::from_config(config)?),
            search: Arc::new(search),
        })
    }
}

/// Error wrapper carrying the HTTP status mapping
#[derive(Debug)]
pub struct ApiError(pub PlannerError);

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        Self(err)
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.0 {
            PlannerError::InvalidCoordinates { .. }
            | PlannerError::InvalidRequest { .. }
            | PlannerError::OutOfRegion { .. } => StatusCode::BAD_REQUEST,
            PlannerError::NoRouteFound { .. } => StatusCode::NOT_FOUND,
            PlannerError::Geocoding { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        let body = Json(json!({
            "error": self.0.code(),
            "message": self.0.user_message(),
        }));
        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RouteBody {
    /// Raw coordinates: `{lat, lon|lng, label?}` objects or `[a, b]` arrays
    pub waypoints: Vec<Value>,
    /// Required for array waypoints whose order is ambiguous
    pub axis_order: Option<AxisOrder>,
    pub num_days: Option<usize>,
    pub max_trail_search_radius_km: Option<f64>,
    pub profile: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/route", post(resolve_route))
        .route("/locations/search", get(search_locations))
        .route("/health", get(health))
        .with_state(state)
}

fn parse_waypoints(validator: &GeoValidator, body: &RouteBody) -> crate::Result<Vec<Waypoint>> {
    let stops = body
        .waypoints
        .iter()
        .map(|raw| {
            let point = validator.normalize(raw, body.axis_order)?;
            let label = raw
                .get("label")
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok::<_, PlannerError>((point, label))
        })
        .collect::<crate::Result<Vec<_>>>()?;
    Ok(Waypoint::sequence(stops))
}

async fn resolve_route(
    State(state): State<AppState>,
    Json(body): Json<RouteBody>,
) -> Result<Json<PlanResult>, ApiError> {
    let waypoints = parse_waypoints(state.planner.validator(), &body)?;
    let options = RouteOptions {
        num_days: body.num_days.unwrap_or(1),
        max_trail_search_radius_km: body.max_trail_search_radius_km,
        profile: body.profile,
    };
    let plan = state.planner.resolve_route(&waypoints, &options).await?;
    Ok(Json(plan))
}

async fn search_locations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Place>>, ApiError> {
    let places = state.search.search(&params.query).await?;
    Ok(Json(places.as_ref().clone()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}
