//! Paste service: creation, lookup, view counting, expiry.

use super::ids::{paste_hash, IdGenerator};
use super::short_url::ShortUrlService;
use super::stats::StatsService;
use super::views::record_view;
use crate::audit::{self, ChangeLogger};
use crate::constants::SHORT_CODE_LEN;
use crate::db::Storage;
use crate::error::AppError;
use crate::models::{EntityKind, Paste, ShortUrl};
use crate::shutdown::ShutdownSignal;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;

const HASH_ATTEMPTS: usize = 3;

/// Creates and serves pastes, orchestrating their stats and short links.
#[derive(Clone)]
pub struct PasteService {
    storage: Storage,
    logger: Arc<dyn ChangeLogger>,
    ids: Arc<IdGenerator>,
    stats: StatsService,
    short_urls: ShortUrlService,
}

impl PasteService {
    pub fn new(
        storage: Storage,
        logger: Arc<dyn ChangeLogger>,
        ids: Arc<IdGenerator>,
        stats: StatsService,
        short_urls: ShortUrlService,
    ) -> Self {
        Self {
            storage,
            logger,
            ids,
            stats,
            short_urls,
        }
    }

    /// Persist a new paste expiring at `expires_at`.
    ///
    /// The id is a high-resolution timestamp; the hash is derived from the
    /// content and that timestamp. A stats row and a short link keyed by the
    /// first six hash characters are created afterwards on a best-effort basis.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] when the content is empty or
    /// `expires_at` is not strictly in the future. Nothing is persisted then.
    pub fn create_paste(&self, content: &str, expires_at: DateTime<Utc>) -> Result<Paste, AppError> {
        self.create_paste_with_link(content, expires_at)
            .map(|(paste, _)| paste)
    }

    /// Same as [`Self::create_paste`], also reporting the paste's short link.
    ///
    /// # Returns
    /// The paste and its short link. The link is `None` when its code is
    /// already taken by another target or could not be stored.
    ///
    /// # Errors
    /// See [`Self::create_paste`].
    pub fn create_paste_with_link(
        &self,
        content: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(Paste, Option<ShortUrl>), AppError> {
        if content.is_empty() {
            return Err(AppError::Validation("content is required".to_string()));
        }
        let now = Utc::now();
        if expires_at <= now {
            return Err(AppError::Validation(
                "expiration must be in the future".to_string(),
            ));
        }

        let paste = self.allocate(content, expires_at, now)?;
        self.storage.pastes.insert_new(&paste)?;

        if let Err(err) = self.stats.create_stats(Some(&paste.id)) {
            tracing::warn!("Failed to create stats for paste {}: {}", paste.id, err);
        }
        let short_url = self.link(&paste);

        audit::record(self.logger.as_ref(), EntityKind::Paste, &paste.id, "created");
        Ok((paste, short_url))
    }

    fn link(&self, paste: &Paste) -> Option<ShortUrl> {
        let code = paste.hash.get(..SHORT_CODE_LEN)?;
        match self.short_urls.create_short_url(code, &paste.hash) {
            Ok(short_url) => Some(short_url),
            Err(AppError::Conflict(_)) => {
                // Only hand out a code that actually resolves to this paste.
                match self.storage.short_urls.get(code) {
                    Ok(existing) if existing.original == paste.hash => Some(existing),
                    _ => {
                        tracing::warn!(
                            "Short code {} is taken, paste {} gets no short link",
                            code,
                            paste.id
                        );
                        None
                    }
                }
            }
            Err(err) => {
                tracing::warn!("Failed to create short url for paste {}: {}", paste.id, err);
                None
            }
        }
    }

    fn allocate(
        &self,
        content: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Paste, AppError> {
        for _ in 0..HASH_ATTEMPTS {
            let nanos = self.ids.next_at(now);
            let hash = paste_hash(content, nanos);
            match self.storage.pastes.get_by_hash(&hash) {
                Err(AppError::NotFound) => {
                    return Ok(Paste {
                        id: nanos.to_string(),
                        hash,
                        content: content.to_string(),
                        created_at: Utc.timestamp_nanos(nanos),
                        expires_at,
                        views: 0,
                    })
                }
                Ok(_) => tracing::debug!("Hash collision on {}, regenerating", hash),
                Err(err) => return Err(err),
            }
        }
        Err(AppError::Conflict(
            "could not allocate a unique paste hash".to_string(),
        ))
    }

    /// # Errors
    /// Returns [`AppError::NotFound`] when no paste has `id`.
    pub fn get_paste_by_id(&self, id: &str) -> Result<Paste, AppError> {
        self.storage.pastes.get(id)
    }

    /// Look a paste up by hash and count the view.
    ///
    /// # Returns
    /// The paste including the view just recorded.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when no paste carries `hash`.
    pub fn get_paste_by_hash(&self, hash: &str) -> Result<Paste, AppError> {
        let paste = self.storage.pastes.get_by_hash(hash)?;
        record_view(&self.storage, &paste.id)
    }

    /// Look a paste up by id and count the view.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when no paste has `id`.
    pub fn view_paste_by_id(&self, id: &str) -> Result<Paste, AppError> {
        record_view(&self.storage, id)
    }

    /// Delete a paste and, best effort, its stats row and short link.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when no paste has `id`.
    pub fn delete_paste(&self, id: &str) -> Result<(), AppError> {
        let paste = self.storage.pastes.get(id)?;
        self.storage.pastes.delete(id)?;
        self.release_dependents(&paste);
        audit::record(self.logger.as_ref(), EntityKind::Paste, id, "deleted");
        Ok(())
    }

    fn release_dependents(&self, paste: &Paste) {
        match self.storage.stats.delete(&paste.id) {
            Ok(()) | Err(AppError::NotFound) => {}
            Err(err) => tracing::warn!("Failed to drop stats for paste {}: {}", paste.id, err),
        }
        let Some(code) = paste.hash.get(..SHORT_CODE_LEN) else {
            return;
        };
        match self.storage.short_urls.get(code) {
            Ok(short_url) if short_url.original == paste.hash => {
                if let Err(err) = self.storage.short_urls.delete(code) {
                    tracing::warn!("Failed to drop short url {}: {}", code, err);
                }
            }
            Ok(_) | Err(AppError::NotFound) => {}
            Err(err) => tracing::warn!("Failed to look up short url {}: {}", code, err),
        }
    }

    pub fn list_pastes(&self) -> Result<Vec<Paste>, AppError> {
        self.storage.pastes.list()
    }

    /// Up to `limit` pastes ordered by their stats view counts, highest first.
    ///
    /// Stats rows without a matching paste are skipped. The returned pastes
    /// carry the stats view count.
    pub fn list_top_pastes(&self, limit: usize) -> Result<Vec<Paste>, AppError> {
        let ranked = self.stats.list_top_stats(usize::MAX)?;
        let mut top = Vec::with_capacity(limit.min(ranked.len()));
        for stats in ranked {
            if top.len() >= limit {
                break;
            }
            match self.storage.pastes.get(&stats.id) {
                Ok(mut paste) => {
                    paste.views = stats.views;
                    top.push(paste);
                }
                Err(AppError::NotFound) => {
                    tracing::debug!("Stats {} has no paste, skipping", stats.id);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(top)
    }

    /// Remove every paste expired at `now` together with its dependents.
    ///
    /// # Returns
    /// The number of pastes removed.
    pub fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let removed = self.storage.pastes.delete_expired(now)?;
        for paste in &removed {
            self.release_dependents(paste);
            audit::record(self.logger.as_ref(), EntityKind::Paste, &paste.id, "expired");
        }
        Ok(removed.len())
    }

    /// Sweep expired pastes every `interval` until `shutdown` fires.
    ///
    /// The first sweep runs immediately. A failed sweep is logged and the
    /// loop keeps going.
    pub async fn run_expiry_sweep(self, interval: Duration, mut shutdown: ShutdownSignal) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,
                _ = ticker.tick() => {}
            }
            match self.delete_expired(Utc::now()) {
                Ok(0) => {}
                Ok(count) => tracing::info!("Removed {} expired paste(s)", count),
                Err(err) => tracing::error!("Expired paste sweep failed: {}", err),
            }
        }
        tracing::debug!("Expiry sweep stopped");
    }
}
