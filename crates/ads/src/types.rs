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

//! Core data types for server and namespace advertisements

use serde::{Deserialize, Serialize};
use url::Url;

/// Serving capabilities declared for a server or namespace.
///
/// Independent booleans with no identity; a missing field in the topology
/// document deserializes as false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Capabilities {
    /// Objects may be read without presenting a token
    pub public_reads: bool,

    /// Objects may be read with an authorized token
    pub reads: bool,

    /// Objects may be written
    pub writes: bool,

    /// Directory-style listings are supported
    pub listings: bool,

    /// Clients may bypass caches and read from the origin directly
    pub direct_reads: bool,
}

/// Role of a serving node in the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerType {
    /// Authoritative data holder for a namespace, possibly writable
    Origin,

    /// Read-only replica, never permitted write/listing/direct-read
    Cache,
}

impl ServerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerType::Origin => "origin",
            ServerType::Cache => "cache",
        }
    }
}

/// One raw server record as described by the legacy topology service.
///
/// Endpoints are `host[:port]` with an optional scheme; `resource` is the
/// globally unique identifier the registry keys on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopologyServer {
    /// Unauthenticated endpoint (scheme optional, defaults to http)
    pub endpoint: String,

    /// Authenticated endpoint (scheme optional, defaults to https)
    pub auth_endpoint: String,

    /// Globally unique resource name
    pub resource: String,
}

/// Versioned namespace metadata consumed by the external authorization
/// layer. Opaque to the director beyond pass-through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Generation {
    /// Maximum token scope depth granted for this namespace version
    pub max_scope_depth: u32,

    /// Namespace version label
    pub version: Option<String>,

    /// Issuer endpoint for tokens minted against this version
    pub token_issuer: Option<String>,
}

/// One namespace declaration in the topology document, with the servers
/// that claim to serve it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopologyNamespace {
    /// Absolute, segment-aligned path prefix
    pub path: String,

    /// Origins serving this namespace
    pub origins: Vec<TopologyServer>,

    /// Caches serving this namespace
    pub caches: Vec<TopologyServer>,

    /// Declared capability set for the namespace
    pub caps: Capabilities,

    /// Ordered version records, newest first
    pub generation: Vec<Generation>,
}

/// The full topology document pulled from the legacy service.
///
/// `caches` is the flat per-role list used for downtime diffing; namespace
/// membership comes from the nested lists on each [`TopologyNamespace`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopologyDocument {
    pub caches: Vec<TopologyServer>,
    pub namespaces: Vec<TopologyNamespace>,
}

/// Normalized advertisement for one namespace, attached to the serving ads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NamespaceAd {
    /// Absolute path prefix that drives matching
    pub path: String,

    /// Ordered version records passed through from the topology document
    pub generation: Vec<Generation>,

    /// Whether objects under this namespace are publicly readable
    pub public_read: bool,

    /// Declared capability set
    pub caps: Capabilities,

    /// True when derived from the legacy bulk-topology ingestion path
    pub from_topology: bool,
}

/// Normalized advertisement for one serving node.
///
/// Owned by the registry once inserted; readers receive shared snapshot
/// references.
#[derive(Debug, Clone, Serialize)]
pub struct ServerAd {
    /// Unique registry key, equal to the topology resource name
    pub name: String,

    /// Normalized unauthenticated URL; None when the endpoint failed to parse
    pub url: Option<Url>,

    /// Normalized authenticated URL; None when the endpoint failed to parse
    pub auth_url: Option<Url>,

    /// Role of this node
    pub server_type: ServerType,

    /// True when derived from the legacy bulk-topology ingestion path
    pub from_topology: bool,

    /// Raw declared capabilities, kept verbatim even for caches
    pub caps: Capabilities,

    /// Mirrored flag: equal to `caps.writes` for origins, always false for caches
    pub writes: bool,

    /// Mirrored flag: equal to `caps.listings` for origins, always false for caches
    pub listings: bool,

    /// Mirrored flag: equal to `caps.direct_reads` for origins, always false for caches
    pub direct_reads: bool,

    /// Namespaces this node declares it serves
    pub namespace_ads: Vec<NamespaceAd>,
}

impl ServerAd {
    /// Whether this ad declares the given namespace path among its associations
    pub fn serves_namespace(&self, path: &str) -> bool {
        self.namespace_ads.iter().any(|ns| ns.path == path)
    }
}
