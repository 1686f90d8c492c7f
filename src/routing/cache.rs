//! Memoized route resolution with in-flight deduplication.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::debug;

use crate::Result;
use crate::cache::TtlCache;
use crate::models::{Point, Route};

/// Waypoint coordinates are compared at this many decimals (about 1 m)
const KEY_PRECISION: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    coordinates: Vec<(i64, i64)>,
    profile: String,
}

impl RouteKey {
    #[must_use]
    pub fn new(waypoints: &[Point], profile: &str) -> Self {
        Self {
            coordinates: waypoints
                .iter()
                .map(|p| p.rounded_coordinates(KEY_PRECISION))
                .collect(),
            profile: profile.to_string(),
        }
    }
}

type InFlight = Shared<BoxFuture<'static, Result<Arc<Route>>>>;

/// Route memo keyed by rounded waypoints and profile.
///
/// Concurrent lookups of the same key share a single computation. Its
/// failure is delivered to every waiter but only successes are stored.
#[derive(Clone)]
pub struct RouteCache {
    routes: Arc<TtlCache<RouteKey, Arc<Route>>>,
    in_flight: Arc<Mutex<HashMap<RouteKey, InFlight>>>,
}

impl RouteCache {
    #[must_use]
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            routes: Arc::new(TtlCache::new("routes", capacity, ttl)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<RouteKey, InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get(&self, key: &RouteKey) -> Option<Arc<Route>> {
        self.routes.get(key)
    }

    pub fn put(&self, key: RouteKey, route: Arc<Route>) {
        self.routes.put(key, route);
    }

    /// Return the cached route for `key`, or run `resolve` exactly once
    /// for all concurrent callers asking for it.
    pub async fn get_or_resolve<F, Fut>(&self, key: RouteKey, resolve: F) -> Result<Arc<Route>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Route>> + Send + 'static,
    {
        if let Some(route) = self.routes.get(&key) {
            return Ok(route);
        }

        let pending = {
            let mut in_flight = self.in_flight();
            // re-check under the lock: a computation may have finished since
            if let Some(route) = self.routes.get(&key) {
                return Ok(route);
            }
            match in_flight.get(&key) {
                Some(existing) => {
                    debug!("Joining in-flight resolution for {:?}", key);
                    existing.clone()
                }
                None => {
                    let computation = resolve();
                    let routes = Arc::clone(&self.routes);
                    let registry = Arc::clone(&self.in_flight);
                    let owned_key = key.clone();
                    let shared = async move {
                        let result = computation.await.map(Arc::new);
                        let mut in_flight =
                            registry.lock().unwrap_or_else(PoisonError::into_inner);
                        if let Ok(route) = &result {
                            routes.put(owned_key.clone(), Arc::clone(route));
                        }
                        in_flight.remove(&owned_key);
                        result
                    }
                    .boxed()
                    .shared();
                    in_flight.insert(key, shared.clone());
                    shared
                }
            }
        };

        pending.await
    }

    pub fn clear(&self) {
        self.routes.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
