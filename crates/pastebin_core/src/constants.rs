//! Shared constants used across pastebin crates.

/// Default API port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default maximum paste size accepted by the API layer.
pub const DEFAULT_MAX_PASTE_SIZE: usize = 10 * 1024 * 1024;

/// Default interval between expired-paste sweeps, in seconds.
pub const DEFAULT_EXPIRED_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

/// Default interval between change-detection polls, in milliseconds.
pub const DEFAULT_CHANGE_POLL_INTERVAL_MS: u64 = 1_000;

/// Capacity of the change-feed channel.
pub const CHANGE_FEED_CAPACITY: usize = 256;

/// Number of hex characters kept from the content digest.
pub const PASTE_HASH_LEN: usize = 10;

/// Number of hash characters used as the short code for a paste.
pub const SHORT_CODE_LEN: usize = 6;

/// Default number of pastes returned by the popular-pastes listing.
pub const DEFAULT_POPULAR_LIMIT: usize = 5;

/// File name for the redb database within the configured data directory.
pub const REDB_FILE_NAME: &str = "data.redb";
