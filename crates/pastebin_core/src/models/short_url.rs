//! Short URL records.

use super::{EntityKind, Record};
use serde::{Deserialize, Serialize};

/// Short code mapping to a paste hash or an external URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortUrl {
    pub id: String,
    pub original: String,
}

impl ShortUrl {
    pub fn new(code: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            id: code.into(),
            original: original.into(),
        }
    }
}

impl Record for ShortUrl {
    const KIND: EntityKind = EntityKind::ShortUrl;

    fn key(&self) -> String {
        self.id.clone()
    }
}
