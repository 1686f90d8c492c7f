//! Route providers and the fallback chain that orders them
//!
//! Providers are tried in a fixed priority order: marked trail network,
//! then a local OSRM engine, then the public OSRM engine.

pub mod cache;
pub mod chain;
pub mod osrm;
pub mod provider;
pub mod trail_network;

pub use cache::{RouteCache, RouteKey};
pub use chain::{ChainState, ProviderChain};
pub use osrm::OsrmProvider;
pub use provider::{RouteProvider, RouteRequest};
pub use trail_network::TrailNetworkProvider;
