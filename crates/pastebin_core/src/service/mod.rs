//! Domain services: one per entity type, sharing one storage context.

/// Identifier and hash generation.
pub mod ids;
/// Paste creation, lookup, and expiry.
pub mod paste;
/// Short URL registration and resolution.
pub mod short_url;
/// View statistics.
pub mod stats;
/// User records.
pub mod user;
mod views;

#[cfg(test)]
mod tests;

pub use ids::IdGenerator;
pub use paste::PasteService;
pub use short_url::ShortUrlService;
pub use stats::StatsService;
pub use user::UserService;

use crate::audit::ChangeLogger;
use crate::db::Storage;
use std::sync::Arc;

/// All services wired to the same storage and audit logger.
#[derive(Clone)]
pub struct Services {
    pub pastes: PasteService,
    pub users: UserService,
    pub stats: StatsService,
    pub short_urls: ShortUrlService,
}

impl Services {
    pub fn new(storage: Storage, logger: Arc<dyn ChangeLogger>) -> Self {
        let ids = Arc::new(IdGenerator::new());
        let stats = StatsService::new(storage.clone(), logger.clone(), ids.clone());
        let short_urls = ShortUrlService::new(storage.clone(), logger.clone());
        let users = UserService::new(storage.clone(), logger.clone());
        let pastes = PasteService::new(storage, logger, ids, stats.clone(), short_urls.clone());
        Self {
            pastes,
            users,
            stats,
            short_urls,
        }
    }
}
