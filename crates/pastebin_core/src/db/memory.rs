//! In-process collections guarded by one mutex each.

use super::snapshot::SnapshotFile;
use super::{ensure_key_unchanged, Collection, PasteCollection};
use crate::error::AppError;
use crate::models::{Paste, Record};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Insertion-ordered records behind a single lock.
///
/// With a snapshot attached, every mutation is applied to a copy, written to
/// disk, and only then swapped in, all while the lock is held. A failed write
/// leaves the in-memory state untouched.
pub struct MemoryCollection<T: Record> {
    records: Mutex<Vec<T>>,
    snapshot: Option<SnapshotFile>,
}

impl<T: Record> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> MemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            snapshot: None,
        }
    }

    /// Load `dir/<kind file>` and keep it in sync with every mutation.
    ///
    /// # Errors
    /// Returns an error when the snapshot cannot be read or parsed.
    pub fn with_snapshot(dir: &Path) -> Result<Self, AppError> {
        let snapshot = SnapshotFile::new(dir.join(T::KIND.file_name()));
        let records = snapshot.load::<T>()?;
        Ok(Self {
            records: Mutex::new(records),
            snapshot: Some(snapshot),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<T>>, AppError> {
        self.records
            .lock()
            .map_err(|_| AppError::poisoned(T::KIND.as_str()))
    }

    fn write<R>(
        &self,
        mutate: impl FnOnce(&mut Vec<T>) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut records = self.lock()?;
        match &self.snapshot {
            None => mutate(&mut records),
            Some(snapshot) => {
                let mut next = records.clone();
                let out = mutate(&mut next)?;
                snapshot.write(&next)?;
                *records = next;
                Ok(out)
            }
        }
    }
}

fn position<T: Record>(records: &[T], id: &str) -> Option<usize> {
    records.iter().position(|record| record.key() == id)
}

impl<T: Record> Collection<T> for MemoryCollection<T> {
    fn save(&self, record: &T) -> Result<(), AppError> {
        let key = record.key();
        self.write(|records| {
            match position(records, &key) {
                Some(index) => records[index] = record.clone(),
                None => records.push(record.clone()),
            }
            Ok(())
        })
    }

    fn insert_new(&self, record: &T) -> Result<(), AppError> {
        let key = record.key();
        self.write(|records| {
            if position(records, &key).is_some() {
                return Err(AppError::Conflict(format!(
                    "{} '{}' already exists",
                    T::KIND,
                    key
                )));
            }
            records.push(record.clone());
            Ok(())
        })
    }

    fn get(&self, id: &str) -> Result<T, AppError> {
        let records = self.lock()?;
        position(&records, id)
            .map(|index| records[index].clone())
            .ok_or(AppError::NotFound)
    }

    fn delete(&self, id: &str) -> Result<(), AppError> {
        self.write(|records| {
            let index = position(records, id).ok_or(AppError::NotFound)?;
            records.remove(index);
            Ok(())
        })
    }

    fn list(&self) -> Result<Vec<T>, AppError> {
        Ok(self.lock()?.clone())
    }

    fn count(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.len())
    }

    fn modify(&self, id: &str, apply: &mut dyn FnMut(&mut T)) -> Result<T, AppError> {
        self.write(|records| {
            let index = position(records, id).ok_or(AppError::NotFound)?;
            let mut updated = records[index].clone();
            apply(&mut updated);
            ensure_key_unchanged(id, &updated)?;
            records[index] = updated.clone();
            Ok(updated)
        })
    }
}

impl PasteCollection for MemoryCollection<Paste> {
    fn get_by_hash(&self, hash: &str) -> Result<Paste, AppError> {
        let records = self.lock()?;
        records
            .iter()
            .find(|paste| paste.hash == hash)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> Result<Vec<Paste>, AppError> {
        {
            let records = self.lock()?;
            if !records.iter().any(|paste| paste.is_expired(now)) {
                return Ok(Vec::new());
            }
        }
        self.write(|records| {
            let (expired, live): (Vec<Paste>, Vec<Paste>) = std::mem::take(records)
                .into_iter()
                .partition(|paste| paste.is_expired(now));
            *records = live;
            Ok(expired)
        })
    }
}
