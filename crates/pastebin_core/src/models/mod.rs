//! Entity records shared by storage backends and services.

/// Paste records and request payloads.
pub mod paste;
/// Short URL records.
pub mod short_url;
/// View-count records.
pub mod stats;
/// User records.
pub mod user;


pub use paste::Paste;
pub use short_url::ShortUrl;
pub use stats::Stats;
pub use user::User;

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// The four entity kinds persisted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Paste,
    User,
    Stats,
    ShortUrl,
}

impl EntityKind {
    /// Every kind, in a stable order.
    pub const ALL: [EntityKind; 4] = [Self::Paste, Self::User, Self::Stats, Self::ShortUrl];

    /// Lowercase name used in audit events and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paste => "paste",
            Self::User => "user",
            Self::Stats => "stats",
            Self::ShortUrl => "shorturl",
        }
    }

    /// Snapshot file name used by the JSON backend.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Paste => "pastes.json",
            Self::User => "users.json",
            Self::Stats => "stats.json",
            Self::ShortUrl => "urls.json",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted entity addressed by a string primary key.
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Entity kind of this record type.
    const KIND: EntityKind;

    /// Primary key of this record.
    fn key(&self) -> String;
}

/// Any entity, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storable {
    Paste(Paste),
    User(User),
    Stats(Stats),
    ShortUrl(ShortUrl),
}

impl Storable {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Paste(_) => EntityKind::Paste,
            Self::User(_) => EntityKind::User,
            Self::Stats(_) => EntityKind::Stats,
            Self::ShortUrl(_) => EntityKind::ShortUrl,
        }
    }

    pub fn key(&self) -> String {
        match self {
            Self::Paste(paste) => paste.key(),
            Self::User(user) => user.key(),
            Self::Stats(stats) => stats.key(),
            Self::ShortUrl(short_url) => short_url.key(),
        }
    }
}

impl From<Paste> for Storable {
    fn from(value: Paste) -> Self {
        Self::Paste(value)
    }
}

impl From<User> for Storable {
    fn from(value: User) -> Self {
        Self::User(value)
    }
}

impl From<Stats> for Storable {
    fn from(value: Stats) -> Self {
        Self::Stats(value)
    }
}

impl From<ShortUrl> for Storable {
    fn from(value: ShortUrl) -> Self {
        Self::ShortUrl(value)
    }
}
