//! Sorted registry — the key-ordered, lock-protected collection backing the
//! airport directory and the airplane visit log.
//!
//! One mutex per registry instance serializes every operation; there is no
//! reader/writer split. The two instantiations differ only in how an insert
//! treats an existing equal key, which is the constructor parameter.

use std::cmp::Ordering;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::records::{AirplaneRecord, AirportRecord};

/// What `insert` does when it meets an existing record with an equal key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnEqual {
    /// Insert the new record immediately before the existing one, so
    /// duplicates accumulate adjacently. Visit-log policy.
    InsertBefore,
    /// Keep the existing record and drop the new one. Directory policy.
    Ignore,
}

/// Keyed records can live in a [`SortedRegistry`].
pub trait Keyed {
    fn key(&self) -> &str;
}

/// A key-ordered collection shared between connection workers.
///
/// Handles are cheap clones over the same interior; the lock is held for the
/// full duration of each operation. Dumps go through [`snapshot`], which
/// copies under the lock so callers never perform I/O while holding it.
///
/// [`snapshot`]: SortedRegistry::snapshot
pub struct SortedRegistry<T> {
    entries: Arc<Mutex<Vec<T>>>,
    on_equal: OnEqual,
}

impl<T> Clone for SortedRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            on_equal: self.on_equal,
        }
    }
}

impl<T: Keyed + Clone> SortedRegistry<T> {
    pub fn new(on_equal: OnEqual) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            on_equal,
        }
    }

    /// Insert `record` keeping ascending key order.
    ///
    /// Scans from the front and places the record before the first existing
    /// key that compares greater-or-equal; under [`OnEqual::Ignore`] an equal
    /// key aborts the insert instead. Returns whether the record was stored.
    pub async fn insert(&self, record: T) -> bool {
        let mut entries = self.entries.lock().await;
        let mut at = entries.len();
        for (i, existing) in entries.iter().enumerate() {
            match existing.key().cmp(record.key()) {
                Ordering::Less => continue,
                Ordering::Equal if self.on_equal == OnEqual::Ignore => return false,
                _ => {
                    at = i;
                    break;
                }
            }
        }
        entries.insert(at, record);
        true
    }

    /// First record with an exactly matching key, cloned out.
    pub async fn find(&self, key: &str) -> Option<T> {
        let entries = self.entries.lock().await;
        entries.iter().find(|r| r.key() == key).cloned()
    }

    /// Remove the first record with an exactly matching key.
    /// Returns whether anything was removed.
    pub async fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.iter().position(|r| r.key() == key) {
            Some(at) => {
                entries.remove(at);
                true
            }
            None => false,
        }
    }

    /// An ordered copy of every record, taken under the lock.
    pub async fn snapshot(&self) -> Vec<T> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// The Mapper's registry — unique airport ids, first registration wins.
pub type AirportDirectory = SortedRegistry<AirportRecord>;

/// A Control's registry — every visit recorded, repeat visitors included.
pub type VisitLog = SortedRegistry<AirplaneRecord>;

/// Create an empty airport directory.
pub fn new_airport_directory() -> AirportDirectory {
    SortedRegistry::new(OnEqual::Ignore)
}

/// Create an empty visit log.
pub fn new_visit_log() -> VisitLog {
    SortedRegistry::new(OnEqual::InsertBefore)
}
