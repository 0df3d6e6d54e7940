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

//! Refresh-cycle error types

use thiserror::Error;

/// Cycle-level failures of a topology refresh.
///
/// Either variant means the registry and filter map were left untouched
/// (no partial-fetch data is ever merged). Field-level URL problems are not
/// errors; they surface as parse issues and warnings instead. Retry and
/// backoff policy belongs to the caller.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The topology document could not be fetched or decoded as a whole
    #[error("topology fetch failed: {0}")]
    Fetch(anyhow::Error),

    /// The cycle was cancelled before any state was merged
    #[error("topology refresh cancelled")]
    Cancelled,
}
