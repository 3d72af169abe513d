//! Identifier and content-hash generation.

use crate::constants::PASTE_HASH_LEN;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Issues strictly increasing nanosecond timestamps.
///
/// Two calls within the same clock tick still yield distinct values.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose next id is at least `last + 1`.
    pub fn starting_after(last: i64) -> Self {
        Self {
            last: AtomicI64::new(last),
        }
    }

    /// Next id for a record created at `now`.
    pub fn next_at(&self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp_nanos_opt().unwrap_or(i64::MAX - 1);
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(candidate.max(prev + 1))
            })
            .unwrap_or_else(|prev| prev);
        candidate.max(previous + 1)
    }

    /// Next id for a record created now, rendered as a string.
    pub fn next_string(&self) -> String {
        self.next_at(Utc::now()).to_string()
    }
}

/// Short content-derived token: blake3 over the content and the generation
/// timestamp, truncated to the first [`PASTE_HASH_LEN`] hex characters.
pub fn paste_hash(content: &str, generated_at: i64) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(content.as_bytes());
    hasher.update(generated_at.to_string().as_bytes());
    let digest = hasher.finalize().to_hex();
    digest[..PASTE_HASH_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::{paste_hash, IdGenerator};
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn ids_increase_within_the_same_instant() {
        let ids = IdGenerator::new();
        let now = Utc::now();
        let first = ids.next_at(now);
        let second = ids.next_at(now);
        assert_eq!(first, now.timestamp_nanos_opt().unwrap());
        assert_eq!(second, first + 1);
    }

    #[test]
    fn seeded_generator_continues_after_the_seed() {
        let far_future = 4_000_000_000_000_000_000;
        let ids = IdGenerator::starting_after(far_future);
        assert_eq!(ids.next_at(Utc::now()), far_future + 1);
        assert_eq!(ids.next_at(Utc::now()), far_future + 2);
    }

    #[test]
    fn ids_stay_unique_across_threads() {
        let ids = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = ids.clone();
                thread::spawn(move || (0..500).map(|_| ids.next_string()).collect::<Vec<_>>())
            })
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().expect("join") {
                assert!(seen.insert(id), "duplicate id issued");
            }
        }
        assert_eq!(seen.len(), 2000);
    }

    #[test]
    fn hash_is_short_hex_and_depends_on_both_inputs() {
        let a = paste_hash("hello", 1);
        assert_eq!(a.len(), 10);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, paste_hash("hello", 1));
        assert_ne!(a, paste_hash("hello", 2));
        assert_ne!(a, paste_hash("world", 1));
    }
}
