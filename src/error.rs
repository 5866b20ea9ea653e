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

//! Error taxonomy for cluster definitions, lookups and per-host tasks.
//!
//! - [`DefinitionError`]: the cluster source is malformed (fatal, nothing is dispatched)
//! - [`UnknownCluster`]: the requested cluster has no entry (fatal)
//! - [`CredentialError`]: identity or trust resolution failed for one host
//! - [`ExecutionError`]: transport, authentication or session failure for one host
//! - [`TaskError`]: what a failed host task reports to the aggregator

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::ssh::handler::HandlerError;

/// Errors in a single `[user@]host[:port]` specification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostSpecError {
    #[error("empty user name before '@' in '{spec}'")]
    EmptyUser { spec: String },

    #[error("missing hostname in '{spec}'")]
    EmptyHost { spec: String },

    #[error("invalid port '{port}' in '{spec}'")]
    InvalidPort { spec: String, port: String },

    #[error("unterminated IPv6 literal in '{spec}'")]
    UnterminatedBracket { spec: String },
}

/// Errors in one host line (`<host-spec> [identity-file]`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostLineError {
    #[error("expected '<host> [identity-file]', found {count} fields")]
    TooManyFields { count: usize },

    #[error(transparent)]
    Spec(#[from] HostSpecError),
}

/// The cluster definition could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("line {line}: host entry '{entry}' appears before any cluster header")]
    HostOutsideSection { line: usize, entry: String },

    #[error("line {line}: invalid cluster header '{header}'")]
    InvalidHeader { line: usize, header: String },

    #[error("line {line}: {source}")]
    InvalidHostLine {
        line: usize,
        #[source]
        source: HostLineError,
    },

    #[error("cluster '{cluster}', entry {index}: {source}")]
    InvalidClusterEntry {
        cluster: String,
        index: usize,
        #[source]
        source: HostLineError,
    },

    #[error("invalid structured cluster definition: {0}")]
    Structured(String),
}

/// The requested cluster is not defined.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown cluster '{name}' (defined: {})", format_known(.known))]
pub struct UnknownCluster {
    pub name: String,
    pub known: Vec<String>,
}

fn format_known(known: &[String]) -> String {
    if known.is_empty() {
        "none".to_string()
    } else {
        known.join(", ")
    }
}

/// Per-host identity or trust resolution failure.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read identity file {}: {source}", .path.display())]
    IdentityUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("identity file {} is passphrase-protected", .path.display())]
    EncryptedIdentity { path: PathBuf },

    #[error("identity file {} is not a usable private key: {reason}", .path.display())]
    InvalidIdentity { path: PathBuf, reason: String },

    #[error("failed to read known hosts file {}: {source}", .path.display())]
    KnownHostsUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no known host key for {host} in {} and strict host key checking is enabled", .known_hosts.display())]
    UnknownHostKey { host: String, known_hosts: PathBuf },

    #[error("{0}")]
    Other(String),
}

/// Per-host transport, authentication or session failure.
///
/// Messages leave the address out; the aggregator prefixes every failure
/// line with it. A remote command that runs and exits non-zero is not an execution error.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("connection timed out after {seconds}s")]
    ConnectTimeout { address: String, seconds: u64 },

    #[error("connection failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: HandlerError,
    },

    #[error("authentication as '{user}' was rejected")]
    AuthRejected { user: String, address: String },

    #[error("command did not complete within {seconds}s")]
    CommandTimeout { address: String, seconds: u64 },

    #[error("session failed: {source}")]
    Session {
        address: String,
        #[source]
        source: russh::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Why a host task failed.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("task panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_error_display() {
        let err = DefinitionError::HostOutsideSection {
            line: 3,
            entry: "web1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "line 3: host entry 'web1' appears before any cluster header"
        );

        let err = DefinitionError::InvalidHostLine {
            line: 7,
            source: HostLineError::Spec(HostSpecError::InvalidPort {
                spec: "db:http".to_string(),
                port: "http".to_string(),
            }),
        };
        assert_eq!(err.to_string(), "line 7: invalid port 'http' in 'db:http'");
    }

    #[test]
    fn test_unknown_cluster_lists_known_names() {
        let err = UnknownCluster {
            name: "stage".to_string(),
            known: vec!["prod".to_string(), "uat".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown cluster 'stage' (defined: prod, uat)"
        );

        let err = UnknownCluster {
            name: "stage".to_string(),
            known: Vec::new(),
        };
        assert_eq!(err.to_string(), "unknown cluster 'stage' (defined: none)");
    }

    #[test]
    fn test_task_error_is_transparent() {
        let err: TaskError = ExecutionError::ConnectTimeout {
            address: "web1:22".to_string(),
            seconds: 30,
        }
        .into();
        assert_eq!(err.to_string(), "connection timed out after 30s");
    }
}
