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

//! Director service and topology refresh orchestration
//!
//! One refresh cycle is fetch → parse → merge → diff. Fetch and parse happen
//! entirely before any shared state is touched, so a failed or cancelled
//! cycle leaves the registry and filter map exactly as they were. Merging is
//! per-ad atomic but not transactional across the batch; readers may see a
//! mix of old and new entries until the cycle ends.

use crate::downtime::{self, FilterMap, FilterReason};
use crate::error::RefreshError;
use crate::source::TopologySource;
use chrono::{DateTime, Utc};
use meshdir_ads::{
    Capabilities, NamespaceAd, ServerAd, ServerType, TopologyDocument, TopologyServer,
    parse_server_ad,
};
use meshdir_registry::{AdRegistry, PathMatch, find_ads_for_path};
use metrics::gauge;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Configuration for the director service
#[derive(Debug, Clone)]
pub struct DirectorConfig {
    /// How long an advertisement stays live without being re-observed
    pub ad_ttl: Duration,

    /// Interval between periodic refresh cycles
    pub refresh_interval: Duration,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            ad_ttl: Duration::from_secs(15 * 60),
            refresh_interval: Duration::from_secs(60),
        }
    }
}

/// Metadata recorded after each successful refresh cycle
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// When the topology documents were fetched
    pub fetched_at: DateTime<Utc>,

    /// Server advertisements merged this cycle
    pub server_ads: usize,

    /// Namespace advertisements across those servers
    pub namespace_ads: usize,

    /// Size of the filter map after the downtime diff
    pub filtered_servers: usize,
}

/// Director service: owns the advertisement registry, the downtime filter
/// map, and the topology source, and exposes the query surface the routing
/// layer consumes.
///
/// All state is per-instance; independent directors never cross-contaminate.
pub struct Director {
    registry: AdRegistry,
    filters: FilterMap,
    source: Arc<dyn TopologySource>,
    config: DirectorConfig,
    /// Serializes refresh cycles: at most one mutates shared state at a time
    refresh_lock: Mutex<()>,
    last_cycle: RwLock<Option<CycleStats>>,
}

impl Director {
    pub fn new(source: Arc<dyn TopologySource>, config: DirectorConfig) -> Self {
        Self {
            registry: AdRegistry::new(),
            filters: FilterMap::new(),
            source,
            config,
            refresh_lock: Mutex::new(()),
            last_cycle: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    pub fn registry(&self) -> &AdRegistry {
        &self.registry
    }

    /// Run one refresh cycle: fetch both topology views, build ads, merge
    /// them into the registry with a fresh TTL, then reconcile downtime.
    ///
    /// Cancellation before the fetch completes aborts with no mutation; it
    /// is also checked once more before merging, but an in-progress merge is
    /// never rolled back. Overlapping calls serialize on the single-flight
    /// lock.
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<(), RefreshError> {
        let _guard = self.refresh_lock.lock().await;

        if cancel.is_cancelled() {
            return Err(RefreshError::Cancelled);
        }

        let active = tokio::select! {
            _ = cancel.cancelled() => return Err(RefreshError::Cancelled),
            doc = self.source.fetch(false) => doc.map_err(RefreshError::Fetch)?,
        };
        let full = tokio::select! {
            _ = cancel.cancelled() => return Err(RefreshError::Cancelled),
            doc = self.source.fetch(true) => doc.map_err(RefreshError::Fetch)?,
        };

        let ads = build_server_ads(&active);

        // Cheap check before any shared state changes
        if cancel.is_cancelled() {
            return Err(RefreshError::Cancelled);
        }

        let server_count = ads.len();
        let namespace_count: usize = ads.iter().map(|ad| ad.namespace_ads.len()).sum();
        for ad in ads {
            self.registry.upsert(ad, self.config.ad_ttl);
        }

        downtime::update_downtime_from_topology(&active, &full, &self.filters);

        let stats = CycleStats {
            fetched_at: Utc::now(),
            server_ads: server_count,
            namespace_ads: namespace_count,
            filtered_servers: self.filters.len(),
        };
        gauge!("meshdir_registry_server_ads").set(self.registry.len() as f64);
        gauge!("meshdir_filtered_servers").set(stats.filtered_servers as f64);
        info!(
            server_ads = stats.server_ads,
            namespace_ads = stats.namespace_ads,
            filtered = stats.filtered_servers,
            "topology refresh cycle completed"
        );
        *self.last_cycle.write() = Some(stats);

        Ok(())
    }

    /// Longest-prefix namespace lookup without downtime filtering.
    pub fn find_ads_for_path(&self, path: &str) -> Option<PathMatch> {
        find_ads_for_path(&self.registry, path)
    }

    /// Namespace lookup as the routing layer uses it: servers currently in
    /// the filter map are excluded from the result.
    pub fn find_serving_ads_for_path(&self, path: &str) -> Option<PathMatch> {
        let mut found = self.find_ads_for_path(path)?;
        found.origins.retain(|ad| !self.filters.is_filtered(&ad.name));
        found.caches.retain(|ad| !self.filters.is_filtered(&ad.name));
        Some(found)
    }

    /// Registry snapshot for administrative listing and diagnostics.
    pub fn list_ads(&self) -> Vec<(String, Arc<ServerAd>)> {
        self.registry.items()
    }

    /// Drop every advertisement; the next cycle rebuilds from scratch.
    pub fn reset(&self) {
        info!("resetting advertisement registry");
        self.registry.clear();
    }

    pub fn is_filtered(&self, name: &str) -> bool {
        self.filters.is_filtered(name)
    }

    pub fn filter_reason(&self, name: &str) -> Option<FilterReason> {
        self.filters.reason(name)
    }

    /// Administratively exclude a server from routing.
    pub fn set_filter(&self, name: impl Into<String>, reason: FilterReason) {
        self.filters.set(name, reason);
    }

    /// Remove a filter entry regardless of reason.
    pub fn clear_filter(&self, name: &str) -> Option<FilterReason> {
        self.filters.remove(name)
    }

    pub fn last_cycle(&self) -> Option<CycleStats> {
        self.last_cycle.read().clone()
    }
}

/// Build all server ads from the active topology document.
///
/// A server listed under several namespaces yields one ad whose namespace
/// list accumulates; the capability set of the first namespace it appears
/// under decides the server-level flags. Field-level URL problems are
/// logged by the parser and never abort the cycle.
fn build_server_ads(doc: &TopologyDocument) -> Vec<ServerAd> {
    let mut ads: HashMap<String, ServerAd> = HashMap::new();

    for ns in &doc.namespaces {
        let ns_ad = NamespaceAd {
            path: ns.path.clone(),
            generation: ns.generation.clone(),
            public_read: ns.caps.public_reads,
            caps: ns.caps,
            from_topology: true,
        };

        for server in &ns.origins {
            attach(&mut ads, server, ServerType::Origin, ns.caps, &ns_ad);
        }
        for server in &ns.caches {
            attach(&mut ads, server, ServerType::Cache, ns.caps, &ns_ad);
        }
    }

    ads.into_values().collect()
}

fn attach(
    ads: &mut HashMap<String, ServerAd>,
    server: &TopologyServer,
    server_type: ServerType,
    caps: Capabilities,
    ns_ad: &NamespaceAd,
) {
    let ad = ads.entry(server.resource.clone()).or_insert_with(|| {
        let parsed = parse_server_ad(server, server_type, caps);
        if !parsed.issues.is_empty() {
            debug!(
                resource = %server.resource,
                issues = parsed.issues.len(),
                "server ad built with endpoint issues"
            );
        }
        parsed.ad
    });

    if !ad.serves_namespace(&ns_ad.path) {
        ad.namespace_ads.push(ns_ad.clone());
    }
}

/// Background driver invoking [`Director::refresh`] on a fixed interval.
///
/// The first tick fires immediately, giving an initial sync right after
/// `start`. Failed cycles are logged and retried on the next tick; routing
/// simply serves previous-cycle data in the meantime.
pub struct RefreshDriver {
    director: Arc<Director>,
    interval: Duration,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefreshDriver {
    pub fn new(director: Arc<Director>) -> Self {
        let interval = director.config().refresh_interval;
        Self {
            director,
            interval,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Spawn the periodic refresh task if not already running.
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }

        info!(interval_secs = self.interval.as_secs(), "starting topology refresh driver");
        let director = Arc::clone(&self.director);
        let cancel = self.cancel.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                match director.refresh(&cancel).await {
                    Ok(()) => debug!("periodic topology refresh succeeded"),
                    Err(RefreshError::Cancelled) => break,
                    Err(err) => error!(error = %err, "periodic topology refresh failed"),
                }
            }
        });

        self.task = Some(handle);
    }

    /// Cancel any in-flight cycle and stop the background task.
    pub fn stop(&mut self) {
        if let Some(handle) = self.task.take() {
            info!("stopping topology refresh driver");
            self.cancel.cancel();
            handle.abort();
        }
    }
}

impl Drop for RefreshDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
