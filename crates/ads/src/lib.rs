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

//! # MeshDir Advertisements
//!
//! Normalized server and namespace advertisement types, plus the parser that
//! converts raw records from the legacy topology service into them.
//!
//! ## Capability Policy
//!
//! - **Origins** may advertise writes, listings, and direct reads; the
//!   top-level flags on [`ServerAd`] mirror the declared capabilities.
//! - **Caches** are read-only by policy: their top-level flags are always
//!   false, while [`ServerAd::caps`] keeps the raw declared values for
//!   introspection.
//!
//! ## Example
//!
//! ```rust
//! use meshdir_ads::{parse_server_ad, Capabilities, ServerType, TopologyServer};
//!
//! let server = TopologyServer {
//!     endpoint: "my-endpoint.com".to_string(),
//!     auth_endpoint: "my-auth-endpoint.com".to_string(),
//!     resource: "MY_SERVER".to_string(),
//! };
//!
//! let parsed = parse_server_ad(&server, ServerType::Origin, Capabilities::default());
//! assert_eq!(parsed.ad.name, "MY_SERVER");
//! assert!(parsed.issues.is_empty());
//! ```

pub mod parse;
pub mod types;

pub use parse::{ParseIssue, ParsedServerAd, parse_server_ad};
pub use types::{
    Capabilities, Generation, NamespaceAd, ServerAd, ServerType, TopologyDocument,
    TopologyNamespace, TopologyServer,
};
