//! Converging position watch.
//!
//! Position fixes improve over the first seconds of a watch. The watch
//! resolves as soon as one fix is accurate enough, and otherwise settles for
//! the best fix seen before the deadline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub point: Point,
    /// Horizontal accuracy radius in meters
    pub accuracy_m: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    /// Resolve immediately with a fix at least this accurate
    pub target_accuracy_m: f64,
    /// Best fix at the deadline must be at least this accurate
    pub acceptable_accuracy_m: f64,
    pub timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            target_accuracy_m: 10.0,
            acceptable_accuracy_m: 30.0,
            timeout: Duration::from_secs(8),
        }
    }
}

/// Wait for a sufficiently accurate position.
///
/// Returns `None` if no acceptable fix arrived before the timeout or the end
/// of the stream. Dropping the returned future stops the watch.
pub async fn watch_position<S>(samples: S, options: WatchOptions) -> Option<PositionSample>
where
    S: Stream<Item = PositionSample>,
{
    let deadline = tokio::time::sleep(options.timeout);
    tokio::pin!(deadline);
    tokio::pin!(samples);

    let mut best: Option<PositionSample> = None;
    loop {
        tokio::select! {
            () = &mut deadline => {
                debug!("Position watch timed out");
                break;
            }
            next = samples.next() => {
                let Some(sample) = next else { break };
                if !sample.point.is_valid() || !sample.accuracy_m.is_finite() {
                    continue;
                }
                if sample.accuracy_m <= options.target_accuracy_m {
                    return Some(sample);
                }
                if best.is_none_or(|b| sample.accuracy_m < b.accuracy_m) {
                    best = Some(sample);
                }
            }
        }
    }

    best.filter(|b| b.accuracy_m <= options.acceptable_accuracy_m)
}
