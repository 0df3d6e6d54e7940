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

//! Typed advertisement registry keyed by server resource name

use crate::store::TtlStore;
use meshdir_ads::{ServerAd, ServerType};
use std::sync::Arc;
use std::time::Duration;

/// TTL-bearing registry of [`ServerAd`] entries keyed by `name`.
///
/// A later upsert with the same name replaces the prior value and resets its
/// TTL. Readers get `Arc` snapshots; the registry retains exclusive ownership
/// of the stored values.
#[derive(Debug, Default)]
pub struct AdRegistry {
    ads: TtlStore<ServerAd>,
}

impl AdRegistry {
    pub fn new() -> Self {
        Self {
            ads: TtlStore::new(),
        }
    }

    /// Insert or refresh an advertisement under its own name.
    pub fn upsert(&self, ad: ServerAd, ttl: Duration) {
        self.ads.upsert(ad.name.clone(), ad, ttl);
    }

    pub fn get(&self, name: &str) -> Option<Arc<ServerAd>> {
        self.ads.get(name)
    }

    /// Snapshot of all live advertisements.
    pub fn items(&self) -> Vec<(String, Arc<ServerAd>)> {
        self.ads.items()
    }

    /// Snapshot of live origin advertisements.
    pub fn origins(&self) -> Vec<Arc<ServerAd>> {
        self.ads
            .items()
            .into_iter()
            .map(|(_, ad)| ad)
            .filter(|ad| ad.server_type == ServerType::Origin)
            .collect()
    }

    /// Snapshot of live cache advertisements.
    pub fn caches(&self) -> Vec<Arc<ServerAd>> {
        self.ads
            .items()
            .into_iter()
            .map(|(_, ad)| ad)
            .filter(|ad| ad.server_type == ServerType::Cache)
            .collect()
    }

    /// Clear every advertisement; used for forced full resyncs.
    pub fn clear(&self) {
        self.ads.clear();
    }

    pub fn len(&self) -> usize {
        self.ads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshdir_ads::{Capabilities, TopologyServer, parse_server_ad};

    const TTL: Duration = Duration::from_secs(60);

    fn ad(resource: &str, server_type: ServerType) -> ServerAd {
        let server = TopologyServer {
            endpoint: format!("{}.example.org:8000", resource.to_lowercase()),
            auth_endpoint: format!("{}.example.org:8443", resource.to_lowercase()),
            resource: resource.to_string(),
        };
        parse_server_ad(&server, server_type, Capabilities::default()).ad
    }

    #[test]
    fn upsert_keys_on_name() {
        let registry = AdRegistry::new();
        registry.upsert(ad("ORIGIN_1", ServerType::Origin), TTL);
        registry.upsert(ad("ORIGIN_1", ServerType::Origin), TTL);
        registry.upsert(ad("CACHE_1", ServerType::Cache), TTL);

        assert_eq!(registry.len(), 2);
        assert!(registry.get("ORIGIN_1").is_some());
    }

    #[test]
    fn role_snapshots_partition_ads() {
        let registry = AdRegistry::new();
        registry.upsert(ad("ORIGIN_1", ServerType::Origin), TTL);
        registry.upsert(ad("CACHE_1", ServerType::Cache), TTL);
        registry.upsert(ad("CACHE_2", ServerType::Cache), TTL);

        assert_eq!(registry.origins().len(), 1);
        assert_eq!(registry.caches().len(), 2);
    }

    #[test]
    fn clear_resets_everything() {
        let registry = AdRegistry::new();
        registry.upsert(ad("ORIGIN_1", ServerType::Origin), TTL);
        registry.clear();

        assert!(registry.is_empty());
        assert!(registry.get("ORIGIN_1").is_none());
    }
}
