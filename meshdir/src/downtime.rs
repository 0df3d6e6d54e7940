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

//! Downtime tracking from successive topology snapshots
//!
//! A server present in the full topology but absent from the active view has
//! silently disappeared; it stays registered (long-lived registration, TTL
//! handled elsewhere) but is marked in the filter map so routing excludes it.
//! Filter entries set by other sources (admin disables) are never touched by
//! the topology diff.

use meshdir_ads::{TopologyDocument, TopologyServer};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Why a server is currently excluded from routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    /// Permanently disabled by an administrator
    PermDisabled,

    /// Temporarily disabled by an administrator
    TempDisabled,

    /// Missing from the active topology view (presumed down)
    TopologyDown,
}

impl FilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterReason::PermDisabled => "permanently disabled",
            FilterReason::TempDisabled => "temporarily disabled",
            FilterReason::TopologyDown => "missing from topology",
        }
    }
}

/// Shared map of server resource name → filter reason.
///
/// Hot-path read target for every routing decision: the read lock is held
/// only per lookup, the write lock only while applying a downed/restored
/// set, and no I/O ever happens under either. Lifecycle is independent of
/// the advertisement registry.
#[derive(Debug, Default)]
pub struct FilterMap {
    inner: RwLock<HashMap<String, FilterReason>>,
}

impl FilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reason(&self, name: &str) -> Option<FilterReason> {
        self.inner.read().get(name).copied()
    }

    pub fn is_filtered(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    /// Set a filter entry, replacing any existing reason. Admin entry point;
    /// the topology diff uses its own non-clobbering path.
    pub fn set(&self, name: impl Into<String>, reason: FilterReason) {
        self.inner.write().insert(name.into(), reason);
    }

    pub fn remove(&self, name: &str) -> Option<FilterReason> {
        self.inner.write().remove(name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Point-in-time copy for diagnostics.
    pub fn snapshot(&self) -> HashMap<String, FilterReason> {
        self.inner.read().clone()
    }
}

/// Set difference `all − active`, compared by resource name, in `all` order.
pub fn find_downed_servers(
    active: &[TopologyServer],
    all: &[TopologyServer],
) -> Vec<TopologyServer> {
    let active_names: HashSet<&str> = active.iter().map(|s| s.resource.as_str()).collect();
    all.iter()
        .filter(|server| !active_names.contains(server.resource.as_str()))
        .cloned()
        .collect()
}

/// Reconcile the filter map with a freshly-fetched topology pair.
///
/// Caches missing from `active` get [`FilterReason::TopologyDown`] unless
/// they already carry a different reason; caches present in `active` whose
/// entry is exactly `TopologyDown` are un-filtered. Idempotent, pure
/// in-memory; both documents come from the same completed fetch so no I/O
/// happens while the write lock is held.
pub fn update_downtime_from_topology(
    active: &TopologyDocument,
    full: &TopologyDocument,
    filters: &FilterMap,
) {
    let downed = find_downed_servers(&active.caches, &full.caches);

    let mut map = filters.inner.write();
    for server in &downed {
        match map.get(&server.resource) {
            Some(_) => {} // existing reasons, topology or otherwise, stay put
            None => {
                info!(resource = %server.resource, "marking server down per topology");
                map.insert(server.resource.clone(), FilterReason::TopologyDown);
            }
        }
    }

    for server in &active.caches {
        if map.get(&server.resource) == Some(&FilterReason::TopologyDown) {
            info!(resource = %server.resource, "server back in active topology, unfiltering");
            map.remove(&server.resource);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(name: &str) -> TopologyServer {
        TopologyServer {
            endpoint: format!("{}.org:8000", name.to_lowercase()),
            auth_endpoint: format!("{}.org:8443", name.to_lowercase()),
            resource: name.to_string(),
        }
    }

    fn doc(caches: Vec<TopologyServer>) -> TopologyDocument {
        TopologyDocument {
            caches,
            ..TopologyDocument::default()
        }
    }

    #[test]
    fn downed_empty_inputs() {
        assert!(find_downed_servers(&[], &[]).is_empty());
    }

    #[test]
    fn downed_none_when_all_active() {
        let all = vec![cache("CACHE_A"), cache("CACHE_B"), cache("CACHE_C")];
        assert!(find_downed_servers(&all, &all).is_empty());
    }

    #[test]
    fn downed_one_missing() {
        let all = vec![
            cache("CACHE_A"),
            cache("CACHE_B"),
            cache("CACHE_C"),
            cache("CACHE_D"),
        ];
        let active = vec![cache("CACHE_A"), cache("CACHE_B"), cache("CACHE_C")];

        let downed = find_downed_servers(&active, &all);
        assert_eq!(downed, vec![cache("CACHE_D")]);
    }

    #[test]
    fn downed_preserves_all_order() {
        let all = vec![
            cache("CACHE_A"),
            cache("CACHE_B"),
            cache("CACHE_C"),
            cache("CACHE_D"),
        ];
        let active = vec![cache("CACHE_B"), cache("CACHE_C")];

        let downed = find_downed_servers(&active, &all);
        assert_eq!(downed, vec![cache("CACHE_A"), cache("CACHE_D")]);
    }

    #[test]
    fn downed_everyone_when_active_empty() {
        let all = vec![
            cache("CACHE_A"),
            cache("CACHE_B"),
            cache("CACHE_C"),
            cache("CACHE_D"),
        ];
        assert_eq!(find_downed_servers(&[], &all), all);
    }

    #[test]
    fn update_is_idempotent() {
        let filters = FilterMap::new();
        let active = doc(vec![]);
        let full = doc(vec![cache("CACHE_A"), cache("CACHE_B")]);

        update_downtime_from_topology(&active, &full, &filters);
        let first = filters.snapshot();
        assert_eq!(first.len(), 2);
        assert_eq!(first.get("CACHE_A"), Some(&FilterReason::TopologyDown));
        assert_eq!(first.get("CACHE_B"), Some(&FilterReason::TopologyDown));

        update_downtime_from_topology(&active, &full, &filters);
        assert_eq!(filters.snapshot(), first);
    }

    #[test]
    fn server_back_online_is_unfiltered() {
        let filters = FilterMap::new();
        let full = doc(vec![cache("CACHE_A"), cache("CACHE_B")]);

        update_downtime_from_topology(&doc(vec![]), &full, &filters);
        assert_eq!(filters.len(), 2);

        // CACHE_A reappears in the active view
        update_downtime_from_topology(&doc(vec![cache("CACHE_A")]), &full, &filters);

        assert_eq!(filters.len(), 1);
        assert!(!filters.is_filtered("CACHE_A"));
        assert_eq!(filters.reason("CACHE_B"), Some(FilterReason::TopologyDown));
    }

    #[test]
    fn downed_set_grows_with_topology() {
        let filters = FilterMap::new();

        update_downtime_from_topology(
            &doc(vec![]),
            &doc(vec![cache("CACHE_A"), cache("CACHE_B")]),
            &filters,
        );
        assert_eq!(filters.len(), 2);

        update_downtime_from_topology(
            &doc(vec![]),
            &doc(vec![cache("CACHE_A"), cache("CACHE_B"), cache("CACHE_C")]),
            &filters,
        );

        assert_eq!(filters.len(), 3);
        for name in ["CACHE_A", "CACHE_B", "CACHE_C"] {
            assert_eq!(filters.reason(name), Some(FilterReason::TopologyDown));
        }
    }

    #[test]
    fn foreign_reasons_never_clobbered_or_removed() {
        let filters = FilterMap::new();
        filters.set("CACHE_A", FilterReason::PermDisabled);

        let full = doc(vec![cache("CACHE_A"), cache("CACHE_B")]);

        // CACHE_A is downed per topology but keeps its admin reason
        update_downtime_from_topology(&doc(vec![]), &full, &filters);
        assert_eq!(filters.reason("CACHE_A"), Some(FilterReason::PermDisabled));

        // CACHE_A back in the active view: only exact TopologyDown entries
        // are removed, the admin filter stays
        update_downtime_from_topology(&doc(vec![cache("CACHE_A")]), &full, &filters);
        assert_eq!(filters.reason("CACHE_A"), Some(FilterReason::PermDisabled));
    }
}
