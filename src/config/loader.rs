// Copyright 2025 Lablup Inc. and Jeongkyu Shin
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

//! Cluster definition loading.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use super::parser::{parse_cluster_file, parse_structured};
use super::types::{ClusterMap, ParseDefaults};

/// Definition file looked up in the working directory when none is given.
pub const DEFAULT_DEFINITION_FILE: &str = "ClFile";

/// On-disk syntax of a cluster definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    /// Indentation-based sections (`ClFile`).
    Lines,
    /// YAML mapping of cluster name to host lines.
    Yaml,
}

impl DefinitionFormat {
    /// Pick the format from the file extension; anything but `.yaml`/`.yml`
    /// is read as the line format.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Lines,
        }
    }
}

/// Read and parse the cluster definition at `path`.
pub async fn load_definition(path: &Path, defaults: &ParseDefaults) -> Result<ClusterMap> {
    let content = fs::read_to_string(path).await.with_context(|| {
        format!(
            "Failed to read cluster definition at {}. Create it or pass --file.",
            path.display()
        )
    })?;

    let format = DefinitionFormat::from_path(path);
    tracing::debug!("Parsing {} as {:?} definition", path.display(), format);

    let clusters = match format {
        DefinitionFormat::Lines => parse_cluster_file(&content, defaults),
        DefinitionFormat::Yaml => parse_structured(&content, defaults),
    }
    .with_context(|| format!("Malformed cluster definition in {}", path.display()))?;

    tracing::debug!(
        "Loaded {} clusters with {} hosts from {}",
        clusters.len(),
        clusters.host_count(),
        path.display()
    );
    Ok(clusters)
}
