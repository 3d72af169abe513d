//! Paste records and request payloads.

use super::{EntityKind, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored text blob with expiry and view tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paste {
    pub id: String,
    pub hash: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub views: u64,
}

impl Paste {
    /// Whether the paste has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl Record for Paste {
    const KIND: EntityKind = EntityKind::Paste;

    fn key(&self) -> String {
        self.id.clone()
    }
}

/// Request payload for creating a paste.
///
/// Fields default so that missing values surface as validation errors rather
/// than extractor rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePasteRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response payload returned after creating a paste.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePasteResponse {
    pub id: String,
    pub hash: String,
    /// Public short link; `null` when the paste has no short code of its own.
    pub short_url: Option<String>,
}

/// Query parameters for the popular-pastes listing.
#[derive(Debug, Default, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<usize>,
}
