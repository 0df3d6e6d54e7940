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

//! Longest-prefix namespace matching over the advertisement registry
//!
//! Matching is segment-aligned: `/my/server` matches `/my/server` and
//! `/my/server/file`, never `/my/server2`. When two namespaces of equal
//! length would both match (not expected in practice, namespace paths are
//! unique), the first one encountered in the snapshot iteration order wins.

use crate::registry::AdRegistry;
use meshdir_ads::{NamespaceAd, ServerAd, ServerType};
use std::sync::Arc;

/// Result of a successful namespace lookup.
///
/// Origins and caches are exactly the registry ads whose declared namespace
/// associations include the matched path; no health or downtime filtering is
/// applied here — that is a separate, composable step.
#[derive(Debug, Clone)]
pub struct PathMatch {
    pub namespace: NamespaceAd,
    pub origins: Vec<Arc<ServerAd>>,
    pub caches: Vec<Arc<ServerAd>>,
}

/// True when `prefix` is a segment-aligned prefix of `path`.
fn is_segment_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        // An advertised "/" serves every absolute path
        return path.starts_with('/');
    }
    if !path.starts_with(prefix) {
        return false;
    }
    matches!(path.as_bytes().get(prefix.len()), None | Some(&b'/'))
}

/// Find the namespace whose path is the longest segment-aligned prefix of
/// `path`, along with the origins and caches serving it.
///
/// Returns `None` when no registered namespace matches; callers treat that
/// as "nothing serves this path", not as an error.
pub fn find_ads_for_path(registry: &AdRegistry, path: &str) -> Option<PathMatch> {
    let ads = registry.items();

    let mut best: Option<NamespaceAd> = None;
    for (_, ad) in &ads {
        for ns in &ad.namespace_ads {
            if !is_segment_prefix(&ns.path, path) {
                continue;
            }
            let longer = match &best {
                None => true,
                Some(current) => {
                    ns.path.trim_end_matches('/').len() > current.path.trim_end_matches('/').len()
                }
            };
            if longer {
                best = Some(ns.clone());
            }
        }
    }

    let namespace = best?;

    let mut origins = Vec::new();
    let mut caches = Vec::new();
    for (_, ad) in ads {
        if !ad.serves_namespace(&namespace.path) {
            continue;
        }
        match ad.server_type {
            ServerType::Origin => origins.push(ad),
            ServerType::Cache => caches.push(ad),
        }
    }

    Some(PathMatch {
        namespace,
        origins,
        caches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshdir_ads::{Capabilities, TopologyServer, parse_server_ad};
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(60);

    fn registry_with(namespaces: &[(&str, &str, ServerType)]) -> AdRegistry {
        let registry = AdRegistry::new();
        for (resource, ns_path, server_type) in namespaces {
            let server = TopologyServer {
                endpoint: format!("{}.example.org", resource.to_lowercase()),
                auth_endpoint: format!("{}.example.org:8443", resource.to_lowercase()),
                resource: resource.to_string(),
            };
            let mut parsed = parse_server_ad(&server, *server_type, Capabilities::default());
            parsed.ad.namespace_ads.push(NamespaceAd {
                path: ns_path.to_string(),
                from_topology: true,
                ..NamespaceAd::default()
            });
            registry.upsert(parsed.ad, TTL);
        }
        registry
    }

    #[test]
    fn segment_prefix_rules() {
        assert!(is_segment_prefix("/my/server", "/my/server"));
        assert!(is_segment_prefix("/my/server", "/my/server/file"));
        assert!(is_segment_prefix("/my/server/", "/my/server/file"));
        assert!(is_segment_prefix("/", "/anything"));
        assert!(!is_segment_prefix("/my/server", "/my/server2"));
        assert!(!is_segment_prefix("/my/server", "/my"));
        assert!(!is_segment_prefix("/my/server", "/other"));
    }

    #[test]
    fn picks_longest_matching_namespace() {
        let registry = registry_with(&[
            ("ORIGIN_1", "/my/server", ServerType::Origin),
            ("ORIGIN_2", "/my/server/2", ServerType::Origin),
        ]);

        let found = find_ads_for_path(&registry, "/my/server/2/path/to/file").unwrap();
        assert_eq!(found.namespace.path, "/my/server/2");
        assert_eq!(found.origins.len(), 1);
        assert_eq!(found.origins[0].name, "ORIGIN_2");

        let found = find_ads_for_path(&registry, "/my/server/path/to/file").unwrap();
        assert_eq!(found.namespace.path, "/my/server");
        assert_eq!(found.origins[0].name, "ORIGIN_1");
    }

    #[test]
    fn rejects_partial_segment_matches() {
        let registry = registry_with(&[("ORIGIN_1", "/my/server", ServerType::Origin)]);
        assert!(find_ads_for_path(&registry, "/my/server2/file").is_none());
    }

    #[test]
    fn no_match_returns_none() {
        let registry = registry_with(&[("ORIGIN_1", "/my/server", ServerType::Origin)]);
        assert!(find_ads_for_path(&registry, "/elsewhere/file").is_none());
    }

    #[test]
    fn root_namespace_matches_everything() {
        let registry = registry_with(&[("ORIGIN_1", "/", ServerType::Origin)]);
        let found = find_ads_for_path(&registry, "/any/path/at/all").unwrap();
        assert_eq!(found.namespace.path, "/");
    }

    #[test]
    fn collects_all_servers_for_matched_namespace() {
        let registry = registry_with(&[
            ("ORIGIN_1", "/data", ServerType::Origin),
            ("CACHE_1", "/data", ServerType::Cache),
            ("CACHE_2", "/data", ServerType::Cache),
            ("CACHE_3", "/other", ServerType::Cache),
        ]);

        let found = find_ads_for_path(&registry, "/data/file").unwrap();
        assert_eq!(found.origins.len(), 1);
        assert_eq!(found.caches.len(), 2);
        assert!(found.caches.iter().all(|ad| ad.name != "CACHE_3"));
    }
}
