//! Configuration management for the route planner
//!
//! Handles loading configuration from files and environment variables,
//! and validates every knob before the planner is constructed.

use crate::PlannerError;
use crate::models::BoundingBox;
use crate::segmenter::MAX_DAYS;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Supported geographic region
    pub region: RegionConfig,
    /// Marked-trail backend and matching
    pub trails: TrailsConfig,
    /// Routing engine endpoints
    pub routing: RoutingConfig,
    /// Elevation lookup service
    pub elevation: ElevationConfig,
    /// Location search service
    pub geocoding: GeocodingConfig,
    /// Multi-day itinerary limits
    pub planning: PlanningConfig,
    /// Cache buckets
    pub cache: CacheConfig,
    /// Duration and difficulty model
    pub stats: StatsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP server
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailsConfig {
    /// Overpass interpreter endpoint
    pub overpass_url: String,
    /// Degrees added to every side of the waypoint bounding box
    pub bbox_padding_deg: f64,
    /// Maximum distance from a waypoint to a marked trail
    pub max_search_radius_km: f64,
    pub timeout_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Routing engine under our control
    pub local_url: String,
    /// Public fallback routing engine
    pub public_url: String,
    /// Routing profile used when a request does not name one
    pub profile: String,
    pub timeout_seconds: u32,
    /// Transient-error retries performed by the HTTP client
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    pub url: String,
    /// Points per lookup request (backend limit is 100)
    pub batch_size: usize,
    pub timeout_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub url: String,
    pub max_results: u32,
    pub timeout_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries per cache bucket
    pub capacity: usize,
    pub route_ttl_seconds: u64,
    pub search_ttl_seconds: u64,
    pub elevation_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub walking_speed_kmh: f64,
    pub ascent_minutes_per_10m: f64,
    pub descent_minutes_per_10m: f64,
    /// Upper bound (exclusive) of elevation gain per km for "easy"
    pub easy_max_gain_per_km: f64,
    /// Upper bound (exclusive) of elevation gain per km for "moderate"
    pub moderate_max_gain_per_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// OTLP/HTTP collector endpoint; span export is disabled when unset
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Longest itinerary a single request may ask for
    pub max_days: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            min_lat: 29.3,
            min_lon: 34.2,
            max_lat: 33.4,
            max_lon: 35.9,
        }
    }
}

impl Default for TrailsConfig {
    fn default() -> Self {
        Self {
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            bbox_padding_deg: 0.1,
            max_search_radius_km: 2.0,
            timeout_seconds: 25,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            local_url: "http://localhost:5000".to_string(),
            public_url: "https://routing.openstreetmap.de/routed-foot".to_string(),
            profile: "foot".to_string(),
            timeout_seconds: 15,
            max_retries: 1,
        }
    }
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            url: "https://api.open-elevation.com/api/v1/lookup".to_string(),
            batch_size: 100,
            timeout_seconds: 20,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            max_results: 5,
            timeout_seconds: 10,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            route_ttl_seconds: 60 * 60,
            search_ttl_seconds: 24 * 60 * 60,
            elevation_ttl_seconds: 7 * 24 * 60 * 60,
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            walking_speed_kmh: 4.0,
            ascent_minutes_per_10m: 1.0,
            descent_minutes_per_10m: 0.33,
            easy_max_gain_per_km: 33.0,
            moderate_max_gain_per_km: 66.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            otlp_endpoint: None,
        }
    }
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self { max_days: 30 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl RegionConfig {
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.min_lat, self.min_lon, self.max_lat, self.max_lon)
    }
}

impl TrailsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl RoutingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl ElevationConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl GeocodingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl CacheConfig {
    #[must_use]
    pub fn route_ttl(&self) -> Duration {
        Duration::from_secs(self.route_ttl_seconds)
    }

    #[must_use]
    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_seconds)
    }

    #[must_use]
    pub fn elevation_ttl(&self) -> Duration {
        Duration::from_secs(self.elevation_ttl_seconds)
    }
}

impl PlannerConfig {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // HIKEPLANNER__ROUTING__LOCAL_URL=... overrides routing.local_url
        builder = builder.add_source(
            Environment::with_prefix("HIKEPLANNER")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: PlannerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hikeplanner").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> std::result::Result<(), PlannerError> {
        self.validate_region()?;
        self.validate_urls()?;
        self.validate_numeric_ranges()?;
        self.validate_logging()?;
        Ok(())
    }

    fn validate_region(&self) -> std::result::Result<(), PlannerError> {
        let r = &self.region;
        let in_range = (-90.0..=90.0).contains(&r.min_lat)
            && (-90.0..=90.0).contains(&r.max_lat)
            && (-180.0..=180.0).contains(&r.min_lon)
            && (-180.0..=180.0).contains(&r.max_lon);
        if !in_range || r.min_lat >= r.max_lat || r.min_lon >= r.max_lon {
            return Err(PlannerError::config(format!(
                "Invalid region bounds: ({}, {}) - ({}, {})",
                r.min_lat, r.min_lon, r.max_lat, r.max_lon
            )));
        }
        Ok(())
    }

    fn validate_urls(&self) -> std::result::Result<(), PlannerError> {
        let urls = [
            ("trails.overpass_url", &self.trails.overpass_url),
            ("routing.local_url", &self.routing.local_url),
            ("routing.public_url", &self.routing.public_url),
            ("elevation.url", &self.elevation.url),
            ("geocoding.url", &self.geocoding.url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PlannerError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL, got '{url}'"
                )));
            }
        }
        if self.routing.profile.trim().is_empty() {
            return Err(PlannerError::config("routing.profile cannot be empty"));
        }
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> std::result::Result<(), PlannerError> {
        if self.cache.capacity == 0 {
            return Err(PlannerError::config("cache.capacity must be at least 1"));
        }
        if !(1..=MAX_DAYS).contains(&self.planning.max_days) {
            return Err(PlannerError::config(format!(
                "planning.max_days must be between 1 and {MAX_DAYS}"
            )));
        }
        if !(1..=100).contains(&self.elevation.batch_size) {
            return Err(PlannerError::config(
                "elevation.batch_size must be between 1 and 100",
            ));
        }
        if self.routing.max_retries > 3 {
            return Err(PlannerError::config("routing.max_retries cannot exceed 3"));
        }
        if self.trails.max_search_radius_km <= 0.0 {
            return Err(PlannerError::config(
                "trails.max_search_radius_km must be positive",
            ));
        }
        if self.trails.bbox_padding_deg < 0.0 || self.trails.bbox_padding_deg > 1.0 {
            return Err(PlannerError::config(
                "trails.bbox_padding_deg must be between 0 and 1",
            ));
        }
        if self.stats.walking_speed_kmh <= 0.0 {
            return Err(PlannerError::config("stats.walking_speed_kmh must be positive"));
        }
        if self.stats.easy_max_gain_per_km <= 0.0
            || self.stats.moderate_max_gain_per_km <= self.stats.easy_max_gain_per_km
        {
            return Err(PlannerError::config(
                "difficulty thresholds must be positive and increasing",
            ));
        }
        Ok(())
    }

    fn validate_logging(&self) -> std::result::Result<(), PlannerError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlannerConfig::default();
        assert_eq!(config.cache.capacity, 100);
        assert_eq!(config.cache.route_ttl(), Duration::from_secs(3600));
        assert_eq!(config.elevation.batch_size, 100);
        assert_eq!(config.routing.profile, "foot");
        assert_eq!(config.trails.max_search_radius_km, 2.0);
        assert_eq!(config.planning.max_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = PlannerConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_max_days() {
        let mut config = PlannerConfig::default();
        config.planning.max_days = 0;
        assert!(config.validate().is_err());
        config.planning.max_days = 10_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_batch_size() {
        let mut config = PlannerConfig::default();
        config.elevation.batch_size = 250;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_thresholds_must_increase() {
        let mut config = PlannerConfig::default();
        config.stats.moderate_max_gain_per_km = 10.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("thresholds"));
    }

    #[test]
    fn test_config_validation_inverted_region() {
        let mut config = PlannerConfig::default();
        config.region.min_lat = 34.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = PlannerConfig::default();
        config.routing.public_url = "routing.example.org".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("routing.public_url"));
    }

    #[test]
    fn test_load_from_missing_path_uses_defaults() {
        let config =
            PlannerConfig::load_from_path(Some(PathBuf::from("/nonexistent/hikeplanner.toml")))
                .unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = PlannerConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("hikeplanner"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
