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

//! Cluster model type definitions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::UnknownCluster;
use crate::host::Host;

use super::utils::{get_current_username, home_dir};

/// Values used for fields a host line leaves out.
///
/// Built once by the binary from the process environment and handed to the
/// parser, which never reads the environment itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDefaults {
    pub user: String,
    pub home: PathBuf,
    pub identity: PathBuf,
}

impl ParseDefaults {
    /// Defaults for `user` with `home`, using `~/.ssh/id_rsa` as identity.
    pub fn new(user: impl Into<String>, home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let identity = home.join(".ssh").join("id_rsa");
        Self {
            user: user.into(),
            home,
            identity,
        }
    }

    /// Defaults for the invoking user.
    pub fn from_env() -> anyhow::Result<Self> {
        let home = home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine the home directory"))?;
        Ok(Self::new(get_current_username(), home))
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        if let Some(user) = user {
            self.user = user;
        }
        self
    }

    pub fn with_identity(mut self, identity: Option<&Path>) -> Self {
        if let Some(identity) = identity {
            self.identity = super::utils::expand_tilde(&identity.to_string_lossy(), &self.home);
        }
        self
    }
}

/// A named group of hosts, in definition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub name: String,
    pub hosts: Vec<Host>,
}

/// Every cluster of a definition, keyed by name.
///
/// Built once per invocation and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMap {
    clusters: BTreeMap<String, Cluster>,
}

impl ClusterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cluster by name.
    pub fn get(&self, name: &str) -> Result<&Cluster, UnknownCluster> {
        self.clusters.get(name).ok_or_else(|| UnknownCluster {
            name: name.to_string(),
            known: self.names().map(str::to_string).collect(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clusters.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total hosts across all clusters.
    pub fn host_count(&self) -> usize {
        self.clusters.values().map(|c| c.hosts.len()).sum()
    }

    /// Open (or reopen) a section. Reopened sections keep their hosts.
    pub(super) fn section_mut(&mut self, name: &str) -> &mut Cluster {
        self.clusters
            .entry(name.to_string())
            .or_insert_with(|| Cluster {
                name: name.to_string(),
                hosts: Vec::new(),
            })
    }
}
