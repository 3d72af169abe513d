//! Change-notification side channel.
//!
//! Producers push new entities into a [`ChangeFeed`]; [`store_from_channel`]
//! persists the ones whose key is not taken yet. [`log_changes`] polls the
//! collections and logs records whose key was not present at the previous
//! poll.

use crate::constants::{CHANGE_FEED_CAPACITY, SHORT_CODE_LEN};
use crate::db::Storage;
use crate::error::AppError;
use crate::models::{EntityKind, Paste, ShortUrl, Stats, Storable, User};
use crate::service::ids::{paste_hash, IdGenerator};
use crate::shutdown::ShutdownSignal;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::mpsc;

/// Sending half of the change feed.
pub type ChangeFeed = mpsc::Sender<Storable>;

/// Create a bounded change feed.
pub fn change_feed() -> (ChangeFeed, mpsc::Receiver<Storable>) {
    mpsc::channel(CHANGE_FEED_CAPACITY)
}

/// Persist every object received on `rx` until shutdown or until all senders
/// are dropped.
///
/// Objects whose key already exists are skipped, so a feed never replaces a
/// stored short link or view counter. A failed insert is logged and the loop
/// continues.
pub async fn store_from_channel(
    mut rx: mpsc::Receiver<Storable>,
    storage: Storage,
    mut shutdown: ShutdownSignal,
) {
    loop {
        let object = tokio::select! {
            _ = shutdown.triggered() => break,
            received = rx.recv() => match received {
                Some(object) => object,
                None => break,
            },
        };
        match storage.insert_new(&object) {
            Ok(()) => tracing::debug!("Stored {} {} from change feed", object.kind(), object.key()),
            Err(AppError::Conflict(_)) => tracing::warn!(
                "{} {} from change feed already exists, skipping",
                object.kind(),
                object.key()
            ),
            Err(err) => tracing::warn!(
                "Failed to store {} {} from change feed: {}",
                object.kind(),
                object.key(),
                err
            ),
        }
    }
    tracing::debug!("Change feed sink stopped");
}

/// Remembers which keys each collection held at the last poll.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    seen: HashMap<EntityKind, HashSet<String>>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record current keys without reporting anything.
    pub fn prime(&mut self, storage: &Storage) -> Result<(), AppError> {
        for kind in EntityKind::ALL {
            let keys = storage.list_kind(kind)?.iter().map(Storable::key).collect();
            self.seen.insert(kind, keys);
        }
        Ok(())
    }

    /// Records whose key was not present at the previous call, in collection
    /// list order.
    ///
    /// A record deleted and re-added between two polls is not reported.
    pub fn detect_new(&mut self, storage: &Storage) -> Result<Vec<Storable>, AppError> {
        let mut found = Vec::new();
        for kind in EntityKind::ALL {
            let records = storage.list_kind(kind)?;
            let previous = self.seen.entry(kind).or_default();
            let current: HashSet<String> = records.iter().map(Storable::key).collect();
            found.extend(
                records
                    .into_iter()
                    .filter(|record| !previous.contains(&record.key())),
            );
            *previous = current;
        }
        Ok(found)
    }
}

/// Log newly persisted records every `interval` until shutdown.
///
/// Records present when the poller starts are not reported.
pub async fn log_changes(storage: Storage, interval: Duration, mut shutdown: ShutdownSignal) {
    let mut detector = ChangeDetector::new();
    if let Err(err) = detector.prime(&storage) {
        tracing::warn!("Change detector could not read initial sizes: {}", err);
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.triggered() => break,
            _ = ticker.tick() => {}
        }
        match detector.detect_new(&storage) {
            Ok(objects) => {
                for object in objects {
                    tracing::info!(entity = object.kind().as_str(), id = %object.key(), "new record");
                }
            }
            Err(err) => tracing::warn!("Change detection failed: {}", err),
        }
    }
    tracing::debug!("Change poller stopped");
}

/// One sample object of each kind, as pushed by [`generate_demo_objects`].
///
/// The paste's `created_at` is the instant its id encodes.
pub fn demo_objects(ids: &IdGenerator) -> Vec<Storable> {
    let nanos = ids.next_at(Utc::now());
    let created_at = Utc.timestamp_nanos(nanos);
    let content = format!("demo paste generated at {}", created_at.to_rfc3339());
    let hash = paste_hash(&content, nanos);
    let paste = Paste {
        id: nanos.to_string(),
        hash: hash.clone(),
        content,
        created_at,
        expires_at: created_at + chrono::Duration::hours(1),
        views: 0,
    };
    let user = User {
        id: nanos,
        username: format!("demo-{}", &hash[..SHORT_CODE_LEN]),
        posts: vec![hash.clone()],
    };
    vec![
        Stats::new(paste.id.clone()).into(),
        ShortUrl::new(&hash[..SHORT_CODE_LEN], &hash).into(),
        user.into(),
        paste.into(),
    ]
}

/// Push a batch of [`demo_objects`] into `feed` every `interval` until
/// shutdown or until the receiving side closes.
pub async fn generate_demo_objects(feed: ChangeFeed, interval: Duration, mut shutdown: ShutdownSignal) {
    let ids = IdGenerator::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    'outer: loop {
        tokio::select! {
            _ = shutdown.triggered() => break,
            _ = ticker.tick() => {}
        }
        for object in demo_objects(&ids) {
            if feed.send(object).await.is_err() {
                tracing::debug!("Change feed closed, stopping demo generator");
                break 'outer;
            }
        }
    }
    tracing::debug!("Demo generator stopped");
}
