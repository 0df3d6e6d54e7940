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

//! # MeshDir Registry
//!
//! Concurrent, TTL-bearing store of server advertisements plus
//! longest-prefix namespace matching over it.
//!
//! ## Design
//!
//! - Reads never serialize against each other: the store is sharded
//!   ([`dashmap`]) and each entry is replaced atomically as a whole, so a
//!   snapshot may mix entries from an in-progress refresh cycle but never
//!   observes a torn one.
//! - Expiry is lazy: entries whose TTL lapsed are excluded from reads and
//!   purged on access. A server with no refresh inside the TTL window is
//!   treated as gone, independently of topology-based downtime filtering.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use meshdir_registry::AdRegistry;
//! use meshdir_ads::{parse_server_ad, Capabilities, ServerType, TopologyServer};
//!
//! let registry = AdRegistry::new();
//! let server = TopologyServer {
//!     endpoint: "origin1.com".to_string(),
//!     auth_endpoint: "origin1.com:8443".to_string(),
//!     resource: "ORIGIN_1".to_string(),
//! };
//! let parsed = parse_server_ad(&server, ServerType::Origin, Capabilities::default());
//! registry.upsert(parsed.ad, Duration::from_secs(900));
//! assert_eq!(registry.items().len(), 1);
//! ```

pub mod matcher;
pub mod registry;
pub mod store;

pub use matcher::{PathMatch, find_ads_for_path};
pub use registry::AdRegistry;
pub use store::TtlStore;
