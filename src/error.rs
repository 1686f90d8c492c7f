//! Error types and handling for the route planner

use thiserror::Error;

/// Main error type for the route-resolution pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// A coordinate was missing, non-numeric, out of range or ambiguous
    #[error("Invalid coordinates: {message}")]
    InvalidCoordinates { message: String },

    /// Request options that are not coordinates (day count, waypoint count)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// A coordinate lies outside the supported geographic region
    #[error("Point outside supported region: {message}")]
    OutOfRegion { message: String },

    /// The trail backend timed out or returned something unusable
    #[error("Trail fetch failed: {message}")]
    TrailFetch { message: String },

    /// One routing tier could not produce a route
    #[error("Route provider unavailable: {message}")]
    RouteProviderUnavailable { message: String },

    /// Every routing tier failed
    #[error("No route found: {message}")]
    NoRouteFound { message: String },

    /// Some elevation batches could not be resolved
    #[error("Elevation partially unavailable: {message}")]
    ElevationPartialFailure { message: String },

    /// Location search backend errors
    #[error("Geocoding error: {message}")]
    Geocoding { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PlannerError {
    pub fn invalid_coordinates<S: Into<String>>(message: S) -> Self {
        Self::InvalidCoordinates {
            message: message.into(),
        }
    }

    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn out_of_region<S: Into<String>>(message: S) -> Self {
        Self::OutOfRegion {
            message: message.into(),
        }
    }

    pub fn trail_fetch<S: Into<String>>(message: S) -> Self {
        Self::TrailFetch {
            message: message.into(),
        }
    }

    pub fn provider_unavailable<S: Into<String>>(message: S) -> Self {
        Self::RouteProviderUnavailable {
            message: message.into(),
        }
    }

    pub fn no_route<S: Into<String>>(message: S) -> Self {
        Self::NoRouteFound {
            message: message.into(),
        }
    }

    pub fn elevation_partial<S: Into<String>>(message: S) -> Self {
        Self::ElevationPartialFailure {
            message: message.into(),
        }
    }

    pub fn geocoding<S: Into<String>>(message: S) -> Self {
        Self::Geocoding {
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the provider chain should move on to the next tier
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlannerError::TrailFetch { .. } | PlannerError::RouteProviderUnavailable { .. }
        )
    }

    /// Stable machine-readable code for API consumers
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            PlannerError::InvalidCoordinates { .. } => "invalid_coordinates",
            PlannerError::InvalidRequest { .. } => "invalid_request",
            PlannerError::OutOfRegion { .. } => "out_of_region",
            PlannerError::TrailFetch { .. } => "trail_fetch_error",
            PlannerError::RouteProviderUnavailable { .. } => "route_provider_unavailable",
            PlannerError::NoRouteFound { .. } => "no_route_found",
            PlannerError::ElevationPartialFailure { .. } => "elevation_partial_failure",
            PlannerError::Geocoding { .. } => "geocoding_error",
            PlannerError::Config { .. } => "config_error",
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::InvalidCoordinates { message } => {
                format!("Invalid coordinates: {message}")
            }
            PlannerError::InvalidRequest { message } => format!("Invalid request: {message}"),
            PlannerError::OutOfRegion { .. } => {
                "One of the points is outside the supported hiking region.".to_string()
            }
            PlannerError::TrailFetch { .. } | PlannerError::RouteProviderUnavailable { .. } => {
                "The routing service is currently unavailable. Please try again later.".to_string()
            }
            PlannerError::NoRouteFound { .. } => {
                "No route could be found between the selected points.".to_string()
            }
            PlannerError::ElevationPartialFailure { .. } => {
                "Elevation data is unavailable for part of the route.".to_string()
            }
            PlannerError::Geocoding { .. } => {
                "Location search failed. Please try again.".to_string()
            }
            PlannerError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PlannerError::invalid_coordinates("lat missing");
        assert!(matches!(err, PlannerError::InvalidCoordinates { .. }));

        let err = PlannerError::no_route("all tiers failed");
        assert!(matches!(err, PlannerError::NoRouteFound { .. }));
        assert_eq!(err.code(), "no_route_found");
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(PlannerError::trail_fetch("timeout").is_recoverable());
        assert!(PlannerError::provider_unavailable("503").is_recoverable());
        assert!(!PlannerError::no_route("x").is_recoverable());
        assert!(!PlannerError::out_of_region("x").is_recoverable());
    }

    #[test]
    fn test_user_messages() {
        let err = PlannerError::invalid_coordinates("latitude 91 out of range");
        assert!(err.user_message().contains("latitude 91"));

        let err = PlannerError::provider_unavailable("connection refused");
        assert!(err.user_message().contains("unavailable"));
        assert!(!err.user_message().contains("connection refused"));
    }
}
