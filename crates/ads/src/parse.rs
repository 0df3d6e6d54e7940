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

//! Parsing of raw topology server records into normalized [`ServerAd`]s
//!
//! URL failures are soft: the affected field is left empty, one warning is
//! logged per failing field, and the issue is reported in the structured
//! outcome so callers never need to intercept log output to observe it.

use crate::types::{Capabilities, ServerAd, ServerType, TopologyServer};
use tracing::warn;
use url::Url;

/// A field-level problem encountered while building a [`ServerAd`].
///
/// Never fatal; the containing refresh cycle proceeds with the field empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIssue {
    /// The unauthenticated endpoint could not be parsed as a URL
    InvalidUnauthenticatedUrl { endpoint: String },

    /// The authenticated endpoint could not be parsed as a URL
    InvalidAuthenticatedUrl { endpoint: String },
}

/// Outcome of parsing one topology server record
#[derive(Debug, Clone)]
pub struct ParsedServerAd {
    pub ad: ServerAd,
    pub issues: Vec<ParseIssue>,
}

/// Normalize an endpoint into a URL, prepending `default_scheme` when the
/// input carries none.
fn normalize_url(endpoint: &str, default_scheme: &str) -> Result<Url, url::ParseError> {
    if endpoint.contains("://") {
        Url::parse(endpoint)
    } else {
        Url::parse(&format!("{default_scheme}://{endpoint}"))
    }
}

/// Convert one raw topology record plus its declared type and capability set
/// into a normalized [`ServerAd`].
///
/// Capability policy is enforced unconditionally: cache ads never carry the
/// mirrored write/listing/direct-read flags regardless of what was declared,
/// while `caps` keeps the raw values. Pure apart from the warnings emitted
/// for unparsable endpoints.
pub fn parse_server_ad(
    server: &TopologyServer,
    server_type: ServerType,
    caps: Capabilities,
) -> ParsedServerAd {
    let mut issues = Vec::new();

    let url = match normalize_url(&server.endpoint, "http") {
        Ok(url) => Some(url),
        Err(err) => {
            warn!(
                resource = %server.resource,
                endpoint = %server.endpoint,
                error = %err,
                "invalid unauthenticated URL for topology server"
            );
            issues.push(ParseIssue::InvalidUnauthenticatedUrl {
                endpoint: server.endpoint.clone(),
            });
            None
        }
    };

    let auth_url = match normalize_url(&server.auth_endpoint, "https") {
        Ok(url) => Some(url),
        Err(err) => {
            warn!(
                resource = %server.resource,
                endpoint = %server.auth_endpoint,
                error = %err,
                "invalid authenticated URL for topology server"
            );
            issues.push(ParseIssue::InvalidAuthenticatedUrl {
                endpoint: server.auth_endpoint.clone(),
            });
            None
        }
    };

    let (writes, listings, direct_reads) = match server_type {
        ServerType::Origin => (caps.writes, caps.listings, caps.direct_reads),
        ServerType::Cache => (false, false, false),
    };

    ParsedServerAd {
        ad: ServerAd {
            name: server.resource.clone(),
            url,
            auth_url,
            server_type,
            from_topology: true,
            caps,
            writes,
            listings,
            direct_reads,
            namespace_ads: Vec::new(),
        },
        issues,
    }
}
