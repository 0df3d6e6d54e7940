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

//! # MeshDir
//!
//! Director of a federated data-distribution mesh: tracks a dynamic
//! population of origins and caches, learns which namespace (path prefix)
//! each serves, and answers "which serving node should handle this path"
//! for a client-facing redirection layer.
//!
//! ## Components
//!
//! - [`Director`]: service object owning the advertisement registry and the
//!   downtime filter map, with an explicit construct → start → stop lifecycle.
//! - [`RefreshDriver`]: periodic background task driving refresh cycles.
//! - [`TopologySource`]: seam for the legacy topology service transport, with
//!   an HTTP implementation and an in-memory one for tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meshdir::{Director, DirectorConfig, HttpTopologySource};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = HttpTopologySource::new("https://topology.example.org/namespaces/json".parse()?);
//!     let director = Arc::new(Director::new(Arc::new(source), DirectorConfig::default()));
//!
//!     director.refresh(&CancellationToken::new()).await?;
//!     if let Some(found) = director.find_serving_ads_for_path("/my/server/file") {
//!         println!("{} origins serve {}", found.origins.len(), found.namespace.path);
//!     }
//!     Ok(())
//! }
//! ```

pub mod director;
pub mod downtime;
pub mod error;
pub mod source;

pub use director::{CycleStats, Director, DirectorConfig, RefreshDriver};
pub use downtime::{FilterMap, FilterReason, find_downed_servers, update_downtime_from_topology};
pub use error::RefreshError;
pub use source::{HttpTopologySource, StaticTopologySource, TopologySource};
