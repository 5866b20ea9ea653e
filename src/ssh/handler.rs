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

//! russh client handler enforcing the resolved trust expectation.

use russh::client::Handler;
use russh::keys::{HashAlg, PublicKey};
use thiserror::Error;

use super::credentials::TrustExpectation;

/// Errors surfaced by the client handler during the handshake.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Ssh(#[from] russh::Error),

    #[error("host key verification failed: server presented {fingerprint}, which is not a known key for this host")]
    HostKeyMismatch { host: String, fingerprint: String },
}

/// SSH client handler for managing server key verification.
#[derive(Debug, Clone)]
pub struct ClientHandler {
    host: String,
    trust: TrustExpectation,
}

impl ClientHandler {
    /// Create a new client handler.
    pub fn new(host: String, trust: TrustExpectation) -> Self {
        Self { host, trust }
    }
}

impl Handler for ClientHandler {
    type Error = HandlerError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.trust {
            TrustExpectation::AnyKey => {
                tracing::debug!("Accepting host key for {} without verification", self.host);
                Ok(true)
            }
            TrustExpectation::Pinned(keys) => {
                if keys
                    .iter()
                    .any(|key| key.key_data() == server_public_key.key_data())
                {
                    Ok(true)
                } else {
                    Err(HandlerError::HostKeyMismatch {
                        host: self.host.clone(),
                        fingerprint: server_public_key.fingerprint(HashAlg::Sha256).to_string(),
                    })
                }
            }
        }
    }
}
