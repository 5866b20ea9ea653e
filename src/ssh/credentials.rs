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

//! Per-host credential and trust resolution.
//!
//! The dispatcher only sees [`CredentialProvider`]. Resolvers whose backing
//! store must not be read concurrently implement
//! [`ExclusiveCredentialProvider`] instead and are wrapped in a
//! [`CriticalSection`], which serializes every lookup.

use async_trait::async_trait;
use russh::keys::{PrivateKey, PublicKey};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::CredentialError;
use crate::host::Host;

use super::known_hosts::{host_key_pattern, KnownHostsIndex, StrictHostKeyChecking};

/// Resolves the credential bundle for one host. Safe to call concurrently.
#[async_trait]
pub trait CredentialProvider: Send + Sync + 'static {
    type Credentials: Send + Sync + 'static;

    async fn resolve(&self, host: &Host) -> Result<Self::Credentials, CredentialError>;
}

/// A resolver that needs exclusive access to its backing store.
#[async_trait]
pub trait ExclusiveCredentialProvider: Send + 'static {
    type Credentials: Send + Sync + 'static;

    async fn resolve_exclusive(
        &mut self,
        host: &Host,
    ) -> Result<Self::Credentials, CredentialError>;
}

/// Serializes lookups against an [`ExclusiveCredentialProvider`].
pub struct CriticalSection<P> {
    inner: Mutex<P>,
}

impl<P> CriticalSection<P> {
    pub fn new(provider: P) -> Self {
        Self {
            inner: Mutex::new(provider),
        }
    }
}

#[async_trait]
impl<P: ExclusiveCredentialProvider> CredentialProvider for CriticalSection<P> {
    type Credentials = P::Credentials;

    async fn resolve(&self, host: &Host) -> Result<Self::Credentials, CredentialError> {
        let mut provider = self.inner.lock().await;
        provider.resolve_exclusive(host).await
    }
}

/// What the server's host key is expected to be.
#[derive(Debug, Clone)]
pub enum TrustExpectation {
    /// The server key must match one of these.
    Pinned(Vec<PublicKey>),
    /// No record for this host; any key is accepted.
    AnyKey,
}

/// Identity material and trust expectation for an SSH connection.
#[derive(Debug, Clone)]
pub struct SshCredentials {
    pub key: Arc<PrivateKey>,
    pub trust: TrustExpectation,
}

/// Reads each host's identity file and looks its host key up in `known_hosts`.
pub struct KeyFileProvider {
    known_hosts: KnownHostsIndex,
    strict_mode: StrictHostKeyChecking,
}

impl KeyFileProvider {
    pub fn new(known_hosts: impl Into<PathBuf>, strict_mode: StrictHostKeyChecking) -> Self {
        Self {
            known_hosts: KnownHostsIndex::new(known_hosts),
            strict_mode,
        }
    }

    async fn trust_for(&mut self, host: &Host) -> Result<TrustExpectation, CredentialError> {
        if self.strict_mode == StrictHostKeyChecking::No {
            return Ok(TrustExpectation::AnyKey);
        }

        let keys = self.known_hosts.lookup(&host.hostname, host.port).await?;
        if !keys.is_empty() {
            return Ok(TrustExpectation::Pinned(keys));
        }

        match self.strict_mode {
            StrictHostKeyChecking::Yes => Err(CredentialError::UnknownHostKey {
                host: host_key_pattern(&host.hostname, host.port),
                known_hosts: self.known_hosts.path().to_path_buf(),
            }),
            _ => {
                tracing::warn!(
                    "No known host key for {}, accepting the key it presents",
                    host.address()
                );
                Ok(TrustExpectation::AnyKey)
            }
        }
    }
}

#[async_trait]
impl ExclusiveCredentialProvider for KeyFileProvider {
    type Credentials = SshCredentials;

    async fn resolve_exclusive(&mut self, host: &Host) -> Result<SshCredentials, CredentialError> {
        let key = load_identity(&host.identity).await?;
        let trust = self.trust_for(host).await?;
        Ok(SshCredentials {
            key: Arc::new(key),
            trust,
        })
    }
}

/// Read and decode an unencrypted private key.
pub async fn load_identity(path: &Path) -> Result<PrivateKey, CredentialError> {
    let pem = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CredentialError::IdentityUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    russh::keys::decode_secret_key(&pem, None).map_err(|e| match e {
        russh::keys::Error::KeyIsEncrypted => CredentialError::EncryptedIdentity {
            path: path.to_path_buf(),
        },
        other => CredentialError::InvalidIdentity {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}
