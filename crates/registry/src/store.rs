// Copyright 2025 MeshDir Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Generic concurrent store with per-entry TTL and lazy expiry

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct Entry<V> {
    value: Arc<V>,
    expires_at: Instant,
}

/// Keyed store mapping `String → Arc<V>` where every entry carries its own
/// expiration deadline.
///
/// Upserting an existing key replaces the value and resets its deadline.
/// Expired entries are invisible to all read operations and purged lazily;
/// no background sweeper is required.
#[derive(Debug)]
pub struct TtlStore<V> {
    entries: DashMap<String, Entry<V>>,
}

impl<V> TtlStore<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert or replace an entry, resetting its expiry to `now + ttl`.
    pub fn upsert(&self, name: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(
            name.into(),
            Entry {
                value: Arc::new(value),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Look up a live entry, purging it if its TTL has lapsed.
    pub fn get(&self, name: &str) -> Option<Arc<V>> {
        let now = Instant::now();
        {
            let entry = self.entries.get(name)?;
            if entry.expires_at > now {
                return Some(Arc::clone(&entry.value));
            }
        }
        // Lapsed; the guard avoids racing a concurrent refresh of the same key
        self.entries.remove_if(name, |_, entry| entry.expires_at <= now);
        None
    }

    /// Point-in-time snapshot of all live entries.
    ///
    /// Iteration does not hold the whole store locked; concurrent writers
    /// proceed per shard. Expired entries encountered along the way are
    /// purged after the snapshot is taken.
    pub fn items(&self) -> Vec<(String, Arc<V>)> {
        let now = Instant::now();
        let mut live = Vec::with_capacity(self.entries.len());
        let mut lapsed = Vec::new();

        for entry in self.entries.iter() {
            if entry.expires_at > now {
                live.push((entry.key().clone(), Arc::clone(&entry.value().value)));
            } else {
                lapsed.push(entry.key().clone());
            }
        }

        if !lapsed.is_empty() {
            debug!(count = lapsed.len(), "purging expired registry entries");
            for key in lapsed {
                self.entries.remove_if(&key, |_, entry| entry.expires_at <= now);
            }
        }

        live
    }

    /// Clear the entire store instantaneously.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|entry| entry.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for TtlStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
