//! redb table definitions shared by storage modules.

use crate::models::EntityKind;
use redb::TableDefinition;

/// Raw table shape: primary key to bincode-encoded record.
pub type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Paste rows keyed by paste id.
pub const PASTES: RecordTable = TableDefinition::new("pastes");
/// User rows keyed by the decimal user id.
pub const USERS: RecordTable = TableDefinition::new("users");
/// Stats rows keyed by tracked id.
pub const STATS: RecordTable = TableDefinition::new("stats");
/// Short URL rows keyed by short code.
pub const SHORT_URLS: RecordTable = TableDefinition::new("short_urls");

/// Table holding records of `kind`.
pub fn table_for(kind: EntityKind) -> RecordTable {
    match kind {
        EntityKind::Paste => PASTES,
        EntityKind::User => USERS,
        EntityKind::Stats => STATS,
        EntityKind::ShortUrl => SHORT_URLS,
    }
}
