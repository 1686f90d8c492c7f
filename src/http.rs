//! Outbound HTTP client construction.
//!
//! All backends share the same shape: a `reqwest` client with a per-tier
//! timeout, wrapped in a transient-error retry middleware with exponential
//! backoff.

use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::{PlannerError, Result};

pub const USER_AGENT: &str = concat!("HikePlanner/", env!("CARGO_PKG_VERSION"));

/// Build a retrying client with the given timeout and retry budget
pub fn build_client(timeout: Duration, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| PlannerError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(Duration::from_millis(200), Duration::from_secs(2))
        .build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}
