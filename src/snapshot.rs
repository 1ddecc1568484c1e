//! The shared map of latest results.
//!
//! [`SnapshotStore`] holds one [`DataPoint`] per configured source.  Writers
//! replace a whole entry and readers copy the whole map, each under the same
//! lock, so nobody ever sees a half-written result.
//!
//! One coarse lock is plenty for a handful of sources polled every few
//! seconds.  The lock never escapes this type, so swapping in per-key
//! locking would not change any caller.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::source::DataPoint;

/// A point-in-time copy of every source's latest result.
pub type Snapshot = HashMap<String, DataPoint>;

/// `name`'s entry in `snapshot`, or a `loading` placeholder when it has none.
pub fn entry_or_loading(snapshot: &Snapshot, name: &str) -> DataPoint {
    snapshot
        .get(name)
        .cloned()
        .unwrap_or_else(|| DataPoint::loading(name))
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    entries: Mutex<Snapshot>,
}

impl SnapshotStore {
    /// A store holding a `loading` placeholder for each name.
    pub fn seeded<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                (name.clone(), DataPoint::loading(name))
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Replace `name`'s entry.  Names that were not seeded are ignored so the
    /// key set always matches the configured sources.  Returns whether the
    /// entry was replaced.
    pub fn write(&self, name: &str, point: DataPoint) -> bool {
        match self.lock().get_mut(name) {
            Some(slot) => {
                *slot = point;
                true
            }
            None => false,
        }
    }

    /// Copy of the whole map.
    pub fn read(&self) -> Snapshot {
        self.lock().clone()
    }

    // Entries are only ever replaced whole, so a poisoned map is still
    // consistent.
    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
