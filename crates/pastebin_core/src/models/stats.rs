//! View-count records.

use super::{EntityKind, Record};
use serde::{Deserialize, Serialize};

/// View counter keyed by the paste id it tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub id: String,
    #[serde(default)]
    pub views: u64,
}

impl Stats {
    /// Fresh counter for `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            views: 0,
        }
    }
}

impl Record for Stats {
    const KIND: EntityKind = EntityKind::Stats;

    fn key(&self) -> String {
        self.id.clone()
    }
}

/// Request payload for creating a stats record.
///
/// A missing id is replaced by a generated one.
#[derive(Debug, Default, Deserialize)]
pub struct CreateStatsRequest {
    #[serde(default)]
    pub id: Option<String>,
}
