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

//! Parsers for the line-oriented `ClFile` format and its structured form.
//!
//! ```text
//! # comment
//! prod:
//!     web1.example.com
//!     deploy@web2.example.com:2222 ~/.ssh/deploy_ed25519
//! ```
//!
//! A line ending in `:` opens a section; every other non-blank, non-comment
//! line is a host belonging to the most recently opened section.

use std::collections::BTreeMap;

use crate::error::{DefinitionError, HostLineError};
use crate::host::{Host, HostSpec, DEFAULT_SSH_PORT};

use super::types::{ClusterMap, ParseDefaults};
use super::utils::expand_tilde;

const COMMENT_MARKER: char = '#';

/// Parse a line-oriented cluster definition.
pub fn parse_cluster_file(
    source: &str,
    defaults: &ParseDefaults,
) -> Result<ClusterMap, DefinitionError> {
    let mut clusters = ClusterMap::new();
    let mut current: Option<String> = None;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }

        if let Some(name) = line.strip_suffix(':') {
            if !is_cluster_name(name) {
                return Err(DefinitionError::InvalidHeader {
                    line: line_no,
                    header: line.to_string(),
                });
            }
            tracing::trace!("line {}: section '{}'", line_no, name);
            clusters.section_mut(name);
            current = Some(name.to_string());
            continue;
        }

        let Some(section) = current.as_deref() else {
            return Err(DefinitionError::HostOutsideSection {
                line: line_no,
                entry: line.to_string(),
            });
        };

        let host = parse_host_line(line, defaults).map_err(|source| {
            DefinitionError::InvalidHostLine {
                line: line_no,
                source,
            }
        })?;
        tracing::trace!("line {}: {} -> {}", line_no, section, host);
        clusters.section_mut(section).hosts.push(host);
    }

    Ok(clusters)
}

/// Parse a structured definition: a YAML mapping of cluster name to a list of
/// host lines. A cluster with no entries may be written as `name:` or `name: []`.
pub fn parse_structured(
    source: &str,
    defaults: &ParseDefaults,
) -> Result<ClusterMap, DefinitionError> {
    let raw: Option<BTreeMap<String, Option<Vec<String>>>> = serde_yaml::from_str(source)
        .map_err(|e| DefinitionError::Structured(e.to_string()))?;

    let mut clusters = ClusterMap::new();
    for (name, entries) in raw.unwrap_or_default() {
        if !is_cluster_name(&name) {
            return Err(DefinitionError::Structured(format!(
                "invalid cluster name '{name}'"
            )));
        }
        let hosts = entries
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                parse_host_line(entry, defaults).map_err(|source| {
                    DefinitionError::InvalidClusterEntry {
                        cluster: name.clone(),
                        index,
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        clusters.section_mut(&name).hosts.extend(hosts);
    }

    Ok(clusters)
}

/// Parse one host line: `[user@]host[:port] [identity-file]`.
///
/// Fields the line leaves out come from `defaults`.
pub fn parse_host_line(line: &str, defaults: &ParseDefaults) -> Result<Host, HostLineError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (spec, identity) = match fields.as_slice() {
        [spec] => (*spec, None),
        [spec, identity] => (*spec, Some(*identity)),
        _ => {
            return Err(HostLineError::TooManyFields {
                count: fields.len(),
            })
        }
    };

    let spec = HostSpec::parse(spec)?;
    let identity = identity
        .map(|path| expand_tilde(path, &defaults.home))
        .unwrap_or_else(|| defaults.identity.clone());

    Ok(Host {
        user: spec.user.unwrap_or_else(|| defaults.user.clone()),
        hostname: spec.hostname,
        port: spec.port.unwrap_or(DEFAULT_SSH_PORT),
        identity,
    })
}

fn is_cluster_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| c.is_whitespace() || c == ':')
}
