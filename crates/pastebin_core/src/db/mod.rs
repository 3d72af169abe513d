//! Storage layer: per-entity collections and the injected storage context.
//!
//! Every backend exposes the same contract per entity type. In-process
//! backends guard each collection with its own lock and never hold one
//! collection's lock while calling into another.

/// redb-backed collections.
pub mod embedded;
/// Mutex-guarded in-process collections.
pub mod memory;
/// JSON snapshot files for the file-backed variant.
pub mod snapshot;
/// redb table definitions.
pub mod tables;


use crate::constants::REDB_FILE_NAME;
use crate::error::AppError;
use crate::models::{EntityKind, Paste, Record, ShortUrl, Stats, Storable, User};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub use embedded::RedbCollection;
pub use memory::MemoryCollection;

/// Entity-addressed persistence for one record type.
pub trait Collection<T: Record>: Send + Sync {
    /// Insert or overwrite by primary key.
    ///
    /// # Errors
    /// Returns a persistence error when the backing store fails.
    fn save(&self, record: &T) -> Result<(), AppError>;

    /// Insert only when the primary key is unused.
    ///
    /// The existence check and the insert happen under the same lock or
    /// write transaction.
    ///
    /// # Errors
    /// Returns [`AppError::Conflict`] when the key already exists.
    fn insert_new(&self, record: &T) -> Result<(), AppError>;

    /// Fetch a record by primary key.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when no record has that key.
    fn get(&self, id: &str) -> Result<T, AppError>;

    /// Remove a record by primary key.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the key is absent.
    fn delete(&self, id: &str) -> Result<(), AppError>;

    /// Return every record. Memory-backed collections keep insertion order.
    fn list(&self) -> Result<Vec<T>, AppError>;

    /// Number of stored records.
    fn count(&self) -> Result<usize, AppError>;

    /// Read-modify-write a single record atomically.
    ///
    /// `apply` must not change the primary key.
    ///
    /// # Returns
    /// The record as persisted after `apply`.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the key is absent.
    fn modify(&self, id: &str, apply: &mut dyn FnMut(&mut T)) -> Result<T, AppError>;
}

/// Paste-specific lookups on top of [`Collection`].
pub trait PasteCollection: Collection<Paste> {
    /// Fetch a paste by its content hash.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when no paste carries `hash`.
    fn get_by_hash(&self, hash: &str) -> Result<Paste, AppError>;

    /// Remove every paste whose expiry is at or before `now`.
    ///
    /// # Returns
    /// The removed pastes.
    fn delete_expired(&self, now: DateTime<Utc>) -> Result<Vec<Paste>, AppError>;
}

pub(crate) fn ensure_key_unchanged<T: Record>(id: &str, record: &T) -> Result<(), AppError> {
    if record.key() == id {
        Ok(())
    } else {
        Err(AppError::StorageMessage(format!(
            "{} '{}' cannot change its primary key",
            T::KIND,
            id
        )))
    }
}

/// Which backend a [`Storage`] is built on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process memory only; state is lost on exit.
    Memory,
    /// Process memory mirrored into one JSON array file per entity.
    #[default]
    Json,
    /// Embedded redb database.
    Redb,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "json" | "file" => Ok(Self::Json),
            "redb" | "db" => Ok(Self::Redb),
            other => Err(AppError::Validation(format!(
                "unknown storage backend '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Json => "json",
            Self::Redb => "redb",
        })
    }
}

/// Storage context owned by the process and handed to every service.
#[derive(Clone)]
pub struct Storage {
    pub pastes: Arc<dyn PasteCollection>,
    pub users: Arc<dyn Collection<User>>,
    pub stats: Arc<dyn Collection<Stats>>,
    pub short_urls: Arc<dyn Collection<ShortUrl>>,
    backend: StorageBackend,
}

impl Storage {
    /// Open the configured backend rooted at `data_dir`.
    ///
    /// # Errors
    /// Returns an error when the directory, snapshot files, or database
    /// cannot be opened.
    pub fn open(backend: StorageBackend, data_dir: &str) -> Result<Self, AppError> {
        match backend {
            StorageBackend::Memory => Ok(Self::in_memory()),
            StorageBackend::Json => Self::json(Path::new(data_dir)),
            StorageBackend::Redb => Self::redb(Path::new(data_dir)),
        }
    }

    /// Volatile storage for tests and throwaway instances.
    pub fn in_memory() -> Self {
        Self {
            pastes: Arc::new(MemoryCollection::<Paste>::new()),
            users: Arc::new(MemoryCollection::<User>::new()),
            stats: Arc::new(MemoryCollection::<Stats>::new()),
            short_urls: Arc::new(MemoryCollection::<ShortUrl>::new()),
            backend: StorageBackend::Memory,
        }
    }

    /// Memory collections persisted as JSON arrays under `dir`.
    ///
    /// # Errors
    /// Returns an error when `dir` cannot be created or a snapshot fails to parse.
    pub fn json(dir: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(dir)?;
        let storage = Self {
            pastes: Arc::new(MemoryCollection::<Paste>::with_snapshot(dir)?),
            users: Arc::new(MemoryCollection::<User>::with_snapshot(dir)?),
            stats: Arc::new(MemoryCollection::<Stats>::with_snapshot(dir)?),
            short_urls: Arc::new(MemoryCollection::<ShortUrl>::with_snapshot(dir)?),
            backend: StorageBackend::Json,
        };
        tracing::info!("Opened JSON storage at {}", dir.display());
        Ok(storage)
    }

    /// redb database stored at `dir/data.redb`.
    ///
    /// # Errors
    /// Returns an error when the database cannot be opened or tables created.
    pub fn redb(dir: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(REDB_FILE_NAME);
        let db = Arc::new(redb::Database::create(&path)?);
        let storage = Self {
            pastes: Arc::new(RedbCollection::<Paste>::new(db.clone())?),
            users: Arc::new(RedbCollection::<User>::new(db.clone())?),
            stats: Arc::new(RedbCollection::<Stats>::new(db.clone())?),
            short_urls: Arc::new(RedbCollection::<ShortUrl>::new(db)?),
            backend: StorageBackend::Redb,
        };
        tracing::info!("Opened redb storage at {}", path.display());
        Ok(storage)
    }

    pub fn backend(&self) -> StorageBackend {
        self.backend
    }

    /// Insert any entity into its collection.
    ///
    /// # Errors
    /// Returns [`AppError::Conflict`] when a record with the same key exists.
    pub fn insert_new(&self, object: &Storable) -> Result<(), AppError> {
        match object {
            Storable::Paste(paste) => self.pastes.insert_new(paste),
            Storable::User(user) => self.users.insert_new(user),
            Storable::Stats(stats) => self.stats.insert_new(stats),
            Storable::ShortUrl(short_url) => self.short_urls.insert_new(short_url),
        }
    }

    /// Every record of `kind`, wrapped as [`Storable`].
    pub fn list_kind(&self, kind: EntityKind) -> Result<Vec<Storable>, AppError> {
        Ok(match kind {
            EntityKind::Paste => wrap(self.pastes.list()?),
            EntityKind::User => wrap(self.users.list()?),
            EntityKind::Stats => wrap(self.stats.list()?),
            EntityKind::ShortUrl => wrap(self.short_urls.list()?),
        })
    }

    /// Number of records of `kind`.
    pub fn count(&self, kind: EntityKind) -> Result<usize, AppError> {
        match kind {
            EntityKind::Paste => self.pastes.count(),
            EntityKind::User => self.users.count(),
            EntityKind::Stats => self.stats.count(),
            EntityKind::ShortUrl => self.short_urls.count(),
        }
    }
}

fn wrap<T: Into<Storable>>(records: Vec<T>) -> Vec<Storable> {
    records.into_iter().map(Into::into).collect()
}
