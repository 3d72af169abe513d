//! Collections stored in an embedded redb database.
//!
//! Each mutation runs in its own write transaction. redb serializes write
//! transactions, which gives read-modify-write operations their atomicity.

use super::tables::{table_for, RecordTable};
use super::{ensure_key_unchanged, Collection, PasteCollection};
use crate::error::AppError;
use crate::models::{Paste, Record};
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use std::marker::PhantomData;
use std::sync::Arc;

/// One redb table holding bincode-encoded records of `T`.
pub struct RedbCollection<T: Record> {
    db: Arc<redb::Database>,
    table: RecordTable,
    _record: PhantomData<fn() -> T>,
}

fn decode<T: Record>(bytes: &[u8]) -> Result<T, AppError> {
    Ok(bincode::deserialize(bytes)?)
}

impl<T: Record> RedbCollection<T> {
    /// Create the backing table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let table = table_for(T::KIND);
        let write_txn = db.begin_write()?;
        write_txn.open_table(table)?;
        write_txn.commit()?;
        Ok(Self {
            db,
            table,
            _record: PhantomData,
        })
    }

    fn put(&self, record: &T, reject_existing: bool) -> Result<(), AppError> {
        let key = record.key();
        let encoded = bincode::serialize(record)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(self.table)?;
            if reject_existing && table.get(key.as_str())?.is_some() {
                return Err(AppError::Conflict(format!(
                    "{} '{}' already exists",
                    T::KIND,
                    key
                )));
            }
            table.insert(key.as_str(), encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl<T: Record> Collection<T> for RedbCollection<T> {
    fn save(&self, record: &T) -> Result<(), AppError> {
        self.put(record, false)
    }

    fn insert_new(&self, record: &T) -> Result<(), AppError> {
        self.put(record, true)
    }

    fn get(&self, id: &str) -> Result<T, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(self.table)?;
        let row = table.get(id)?;
        match row {
            Some(value) => decode(value.value()),
            None => Err(AppError::NotFound),
        }
    }

    fn delete(&self, id: &str) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(self.table)?;
            let removed = table.remove(id)?.is_some();
            if !removed {
                return Err(AppError::NotFound);
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<T>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(self.table)?;
        let mut records = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            records.push(decode(value.value())?);
        }
        Ok(records)
    }

    fn count(&self) -> Result<usize, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(self.table)?;
        Ok(table.len()? as usize)
    }

    fn modify(&self, id: &str, apply: &mut dyn FnMut(&mut T)) -> Result<T, AppError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(self.table)?;
            let Some(guard) = table.get(id)? else {
                return Err(AppError::NotFound);
            };
            let mut record: T = decode(guard.value())?;
            drop(guard);

            apply(&mut record);
            ensure_key_unchanged(id, &record)?;
            let encoded = bincode::serialize(&record)?;
            table.insert(id, encoded.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(updated)
    }
}

impl PasteCollection for RedbCollection<Paste> {
    fn get_by_hash(&self, hash: &str) -> Result<Paste, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(self.table)?;
        for entry in table.iter()? {
            let (_, value) = entry?;
            let paste: Paste = decode(value.value())?;
            if paste.hash == hash {
                return Ok(paste);
            }
        }
        Err(AppError::NotFound)
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> Result<Vec<Paste>, AppError> {
        let write_txn = self.db.begin_write()?;
        let expired = {
            let mut table = write_txn.open_table(self.table)?;
            let mut expired = Vec::new();
            for entry in table.iter()? {
                let (_, value) = entry?;
                let paste: Paste = decode(value.value())?;
                if paste.is_expired(now) {
                    expired.push(paste);
                }
            }
            for paste in &expired {
                table.remove(paste.id.as_str())?;
            }
            expired
        };
        write_txn.commit()?;
        Ok(expired)
    }
}
