//! View-count service.

use crate::audit::{self, ChangeLogger};
use crate::db::Storage;
use crate::error::AppError;
use crate::models::{EntityKind, Stats};
use crate::service::ids::IdGenerator;
use std::sync::Arc;

/// Creates, counts, and ranks view statistics.
#[derive(Clone)]
pub struct StatsService {
    storage: Storage,
    logger: Arc<dyn ChangeLogger>,
    ids: Arc<IdGenerator>,
}

impl StatsService {
    pub fn new(storage: Storage, logger: Arc<dyn ChangeLogger>, ids: Arc<IdGenerator>) -> Self {
        Self {
            storage,
            logger,
            ids,
        }
    }

    /// Create a zeroed counter for `id`, generating an id when none is given.
    ///
    /// # Errors
    /// Returns [`AppError::Conflict`] when a counter for `id` already exists.
    pub fn create_stats(&self, id: Option<&str>) -> Result<Stats, AppError> {
        let id = id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.ids.next_string());
        let stats = Stats::new(id);
        self.storage.stats.insert_new(&stats)?;
        audit::record(self.logger.as_ref(), EntityKind::Stats, &stats.id, "created");
        Ok(stats)
    }

    /// Atomically add one view to `id`.
    ///
    /// Concurrent callers are serialized by the backend; no increment is lost.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when `id` has no stats record.
    pub fn increment_views(&self, id: &str) -> Result<Stats, AppError> {
        self.storage.stats.modify(id, &mut |stats| stats.views += 1)
    }

    pub fn get_stats_by_id(&self, id: &str) -> Result<Stats, AppError> {
        self.storage.stats.get(id)
    }

    pub fn delete_stats(&self, id: &str) -> Result<(), AppError> {
        self.storage.stats.delete(id)?;
        audit::record(self.logger.as_ref(), EntityKind::Stats, id, "deleted");
        Ok(())
    }

    pub fn list_stats(&self) -> Result<Vec<Stats>, AppError> {
        self.storage.stats.list()
    }

    /// Up to `limit` counters ordered by views, highest first.
    pub fn list_top_stats(&self, limit: usize) -> Result<Vec<Stats>, AppError> {
        let mut all = self.storage.stats.list()?;
        all.sort_by(|a, b| b.views.cmp(&a.views));
        all.truncate(limit);
        Ok(all)
    }
}
