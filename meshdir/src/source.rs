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

//! Topology document sources
//!
//! The legacy topology service exposes two views of the federation: the
//! currently-active servers and the full known set including downed ones
//! (`includeDowned` query flag). The orchestrator needs both to diff out
//! silently-disappeared servers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use meshdir_ads::TopologyDocument;
use parking_lot::RwLock;
use reqwest::Client;
use std::time::Duration;
use url::Url;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport seam for fetching topology documents.
///
/// `include_downed = false` yields the active view, `true` the full known
/// set. A transport or decode failure is a cycle-level error for the caller.
#[async_trait]
pub trait TopologySource: Send + Sync {
    async fn fetch(&self, include_downed: bool) -> Result<TopologyDocument>;
}

/// HTTP source pulling JSON topology documents from the configured URL.
pub struct HttpTopologySource {
    client: Client,
    base_url: Url,
}

impl HttpTopologySource {
    pub fn new(base_url: Url) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }

    /// Use a caller-provided client (custom timeouts, proxies).
    pub fn with_client(base_url: Url, client: Client) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl TopologySource for HttpTopologySource {
    async fn fetch(&self, include_downed: bool) -> Result<TopologyDocument> {
        let mut url = self.base_url.clone();
        if include_downed {
            url.query_pairs_mut().append_pair("includeDowned", "true");
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("requesting topology document from {url}"))?
            .error_for_status()
            .context("topology service returned an error status")?;

        response
            .json::<TopologyDocument>()
            .await
            .context("decoding topology document")
    }
}

/// In-memory source serving fixed documents; used by tests and for seeding.
#[derive(Debug, Default)]
pub struct StaticTopologySource {
    active: RwLock<TopologyDocument>,
    full: RwLock<TopologyDocument>,
}

impl StaticTopologySource {
    pub fn new(active: TopologyDocument, full: TopologyDocument) -> Self {
        Self {
            active: RwLock::new(active),
            full: RwLock::new(full),
        }
    }

    pub fn set_active(&self, doc: TopologyDocument) {
        *self.active.write() = doc;
    }

    pub fn set_full(&self, doc: TopologyDocument) {
        *self.full.write() = doc;
    }
}

#[async_trait]
impl TopologySource for StaticTopologySource {
    async fn fetch(&self, include_downed: bool) -> Result<TopologyDocument> {
        let doc = if include_downed {
            self.full.read().clone()
        } else {
            self.active.read().clone()
        };
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshdir_ads::TopologyServer;

    #[tokio::test]
    async fn static_source_distinguishes_views() {
        let cache = TopologyServer {
            endpoint: "cacheA.org:8000".to_string(),
            auth_endpoint: "cacheA.org:8443".to_string(),
            resource: "CACHE_A".to_string(),
        };
        let full = TopologyDocument {
            caches: vec![cache],
            ..TopologyDocument::default()
        };
        let source = StaticTopologySource::new(TopologyDocument::default(), full);

        assert!(source.fetch(false).await.unwrap().caches.is_empty());
        assert_eq!(source.fetch(true).await.unwrap().caches.len(), 1);
    }

    #[test]
    fn include_downed_flag_shapes_the_url() {
        let base: Url = "https://topo.example.org/namespaces/json".parse().unwrap();
        let mut url = base.clone();
        url.query_pairs_mut().append_pair("includeDowned", "true");
        assert_eq!(
            url.as_str(),
            "https://topo.example.org/namespaces/json?includeDowned=true"
        );
    }
}
