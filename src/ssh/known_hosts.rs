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

use clap::ValueEnum;
use russh::keys::PublicKey;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::CredentialError;

/// Mode for host key checking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StrictHostKeyChecking {
    /// Always verify host keys (fail on unknown/changed)
    Yes,
    /// Never verify host keys (accept all)
    No,
    /// Verify known hosts, accept unknown ones
    #[default]
    #[value(alias = "tofu")]
    AcceptNew,
}

/// Get the default known_hosts file path
pub fn default_known_hosts_path(home: &Path) -> PathBuf {
    home.join(".ssh").join("known_hosts")
}

/// Host keys from a `known_hosts` file, indexed by host pattern.
///
/// The file is read on the first lookup. Lookups take `&mut self`, so a
/// shared index has to sit behind a lock.
#[derive(Debug)]
pub struct KnownHostsIndex {
    path: PathBuf,
    entries: Option<HashMap<String, Vec<PublicKey>>>,
}

impl KnownHostsIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keys recorded for `hostname` on `port`. Empty when the host is unknown.
    pub async fn lookup(
        &mut self,
        hostname: &str,
        port: u16,
    ) -> Result<Vec<PublicKey>, CredentialError> {
        if self.entries.is_none() {
            self.entries = Some(self.load().await?);
        }

        let key = host_key_pattern(hostname, port);
        Ok(self
            .entries
            .as_ref()
            .and_then(|entries| entries.get(&key))
            .cloned()
            .unwrap_or_default())
    }

    async fn load(&self) -> Result<HashMap<String, Vec<PublicKey>>, CredentialError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let entries = parse_known_hosts(&content);
                tracing::debug!(
                    "Loaded {} host patterns from {:?}",
                    entries.len(),
                    self.path
                );
                Ok(entries)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Known hosts file not found at {:?}", self.path);
                Ok(HashMap::new())
            }
            Err(source) => Err(CredentialError::KnownHostsUnreadable {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// The pattern `known_hosts` uses for a host: `host` on port 22, `[host]:port` otherwise.
pub fn host_key_pattern(hostname: &str, port: u16) -> String {
    if port == 22 {
        hostname.to_string()
    } else {
        format!("[{hostname}]:{port}")
    }
}

/// Parse `known_hosts` content into host pattern -> keys.
///
/// Hashed hostnames, wildcard patterns, negations and `@cert-authority` /
/// `@revoked` lines are skipped.
pub fn parse_known_hosts(content: &str) -> HashMap<String, Vec<PublicKey>> {
    let mut entries: HashMap<String, Vec<PublicKey>> = HashMap::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('@') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(hosts), Some(_algorithm), Some(key_data)) =
            (fields.next(), fields.next(), fields.next())
        else {
            tracing::trace!("known_hosts line {}: too few fields", idx + 1);
            continue;
        };

        let key = match russh::keys::parse_public_key_base64(key_data) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("known_hosts line {}: unreadable key: {}", idx + 1, e);
                continue;
            }
        };

        for pattern in hosts.split(',') {
            if pattern.starts_with('|') || pattern.starts_with('!') || pattern.contains(['*', '?'])
            {
                continue;
            }
            entries
                .entry(pattern.to_string())
                .or_default()
                .push(key.clone());
        }
    }

    entries
}
