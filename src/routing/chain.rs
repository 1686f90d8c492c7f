//! Ordered fallback across routing tiers.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::provider::{RouteProvider, RouteRequest};
use crate::models::Route;
use crate::{PlannerError, Result};

/// Position of the chain in its fixed tier order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    TryTrailNetwork,
    TryLocalEngine,
    TryPublicEngine,
    Exhausted,
}

impl ChainState {
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            ChainState::TryTrailNetwork => ChainState::TryLocalEngine,
            ChainState::TryLocalEngine => ChainState::TryPublicEngine,
            ChainState::TryPublicEngine | ChainState::Exhausted => ChainState::Exhausted,
        }
    }
}

/// Tries each tier in order and returns the first complete route.
///
/// Tiers run strictly one after another so that the produced route is
/// always the one from the highest-priority tier that succeeded.
pub struct ProviderChain {
    trail_network: Arc<dyn RouteProvider>,
    local_engine: Arc<dyn RouteProvider>,
    public_engine: Arc<dyn RouteProvider>,
}

impl ProviderChain {
    #[must_use]
    pub fn new(
        trail_network: Arc<dyn RouteProvider>,
        local_engine: Arc<dyn RouteProvider>,
        public_engine: Arc<dyn RouteProvider>,
    ) -> Self {
        Self {
            trail_network,
            local_engine,
            public_engine,
        }
    }

    fn provider_for(&self, state: ChainState) -> Option<&Arc<dyn RouteProvider>> {
        match state {
            ChainState::TryTrailNetwork => Some(&self.trail_network),
            ChainState::TryLocalEngine => Some(&self.local_engine),
            ChainState::TryPublicEngine => Some(&self.public_engine),
            ChainState::Exhausted => None,
        }
    }

    #[instrument(skip_all, fields(waypoints = request.waypoints.len()))]
    pub async fn resolve(&self, request: &RouteRequest) -> Result<Route> {
        let mut state = ChainState::TryTrailNetwork;
        let mut failures: Vec<String> = Vec::new();

        while let Some(provider) = self.provider_for(state) {
            let source = provider.source();
            match provider.route(request).await {
                Ok(route) if route.geometry.len() >= 2 => {
                    info!("Route resolved by {}", source.as_str());
                    return Ok(route);
                }
                Ok(_) => {
                    warn!("{} returned a degenerate route", source.as_str());
                    failures.push(format!("{}: degenerate geometry", source.as_str()));
                }
                Err(e) => {
                    warn!("{} failed: {}", source.as_str(), e);
                    failures.push(e.to_string());
                }
            }
            state = state.next();
        }

        Err(PlannerError::no_route(failures.join("; ")))
    }
}
