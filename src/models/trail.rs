use serde::{Deserialize, Serialize};

use super::Point;

/// Administrative scope of the authority marking a trail
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NetworkTier {
    National,
    Regional,
    Local,
    Unmarked,
}

/// Marked trail geometry, immutable once fetched
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Trail {
    /// Backend way id
    pub id: i64,
    pub name: String,
    pub network_tier: NetworkTier,
    /// Raw difficulty tag (e.g. `sac_scale`), "unknown" when untagged
    pub difficulty_tag: String,
    pub geometry: Vec<Point>,
}
