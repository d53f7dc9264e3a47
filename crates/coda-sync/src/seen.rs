// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

/// Bounded dedupe set keyed by store-assigned message id.
///
/// Shared between the push and poll paths of one consumer so that a
/// message delivered by both is only surfaced once. Eviction is safe:
/// anything old enough to fall out of the cache is also old enough that
/// neither path will re-deliver it as new.
pub struct SeenSet {
    ids: Mutex<LruCache<i64, ()>>,
}

impl SeenSet {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            ids: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Record an id, returning `true` if it was not already present.
    pub fn insert(&self, id: i64) -> bool {
        self.ids.lock().unwrap().put(id, ()).is_none()
    }

    /// Whether the id has been recorded (refreshes its recency).
    pub fn contains(&self, id: i64) -> bool {
        self.ids.lock().unwrap().get(&id).is_some()
    }
}
