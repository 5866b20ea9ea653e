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

//! Remote command execution over SSH.

use async_trait::async_trait;
use russh::client::{Config, Handle};
use russh::keys::PrivateKeyWithHashAlg;
use russh::ChannelMsg;
use std::future::Future;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ExecutionError;
use crate::host::Host;

use super::credentials::SshCredentials;
use super::handler::ClientHandler;

/// Default time allowed for TCP connect, handshake and authentication.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default time allowed for the remote command to finish.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

// Initial capacities for the output buffers.
const STDOUT_BUFFER_SIZE: usize = 8192;
const STDERR_BUFFER_SIZE: usize = 1024;

/// Remote stream a chunk of output arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Everything a remote command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Arrival order of the bytes in `stdout` and `stderr`, filled by
    /// [`push`](Self::push). When empty, stdout is taken to precede stderr.
    pub chunks: Vec<(OutputStream, Range<usize>)>,
    /// Exit status reported by the server, if any.
    pub exit_status: Option<u32>,
    /// Name of the signal that terminated the command, if any.
    pub exit_signal: Option<String>,
}

impl CommandOutput {
    /// Append `data` to `stream`, recording where it falls in arrival order.
    pub fn push(&mut self, stream: OutputStream, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let buf = match stream {
            OutputStream::Stdout => &mut self.stdout,
            OutputStream::Stderr => &mut self.stderr,
        };
        let start = buf.len();
        buf.extend_from_slice(data);
        let end = buf.len();

        // Consecutive data on the same stream extends the last chunk.
        if let Some((last, range)) = self.chunks.last_mut() {
            if *last == stream && range.end == start {
                range.end = end;
                return;
            }
        }
        self.chunks.push((stream, start..end));
    }

    /// Output segments in the order the host produced them.
    pub fn segments(&self) -> Vec<(OutputStream, &[u8])> {
        if self.chunks.is_empty() {
            return [
                (OutputStream::Stdout, self.stdout.as_slice()),
                (OutputStream::Stderr, self.stderr.as_slice()),
            ]
            .into_iter()
            .filter(|(_, bytes)| !bytes.is_empty())
            .collect();
        }

        self.chunks
            .iter()
            .map(|(stream, range)| {
                let buf = match stream {
                    OutputStream::Stdout => &self.stdout,
                    OutputStream::Stderr => &self.stderr,
                };
                (*stream, &buf[range.clone()])
            })
            .collect()
    }
}

/// Runs one command on one host with already-resolved credentials.
///
/// A command that runs and exits non-zero is still `Ok`; errors are for
/// connection, authentication and session failures.
#[async_trait]
pub trait RemoteExecutor<C>: Send + Sync + 'static {
    async fn execute(
        &self,
        host: &Host,
        credentials: &C,
        command: &str,
    ) -> Result<CommandOutput, ExecutionError>;
}

/// [`RemoteExecutor`] backed by russh, one connection per call.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    connect_timeout: Option<Duration>,
    command_timeout: Option<Duration>,
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_COMMAND_TIMEOUT_SECS)
    }
}

impl SshExecutor {
    /// Timeouts are in seconds; zero disables the limit.
    pub fn new(connect_timeout_secs: u64, command_timeout_secs: u64) -> Self {
        let limit = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        Self {
            connect_timeout: limit(connect_timeout_secs),
            command_timeout: limit(command_timeout_secs),
        }
    }

    async fn connect(
        &self,
        host: &Host,
        credentials: &SshCredentials,
    ) -> Result<Handle<ClientHandler>, ExecutionError> {
        let address = host.address();
        let config = Arc::new(Config::default());
        let handler = ClientHandler::new(address.clone(), credentials.trust.clone());

        let mut handle =
            russh::client::connect(config, (host.hostname.as_str(), host.port), handler)
                .await
                .map_err(|source| ExecutionError::Connect {
                    address: address.clone(),
                    source,
                })?;

        let session_error = |source: russh::Error| ExecutionError::Session {
            address: address.clone(),
            source,
        };
        let hash_alg = handle
            .best_supported_rsa_hash()
            .await
            .map_err(session_error)?
            .flatten();
        let auth = handle
            .authenticate_publickey(
                host.user.as_str(),
                PrivateKeyWithHashAlg::new(Arc::clone(&credentials.key), hash_alg),
            )
            .await
            .map_err(session_error)?;

        if !auth.success() {
            return Err(ExecutionError::AuthRejected {
                user: host.user.clone(),
                address,
            });
        }

        tracing::debug!("Authenticated to {} as {}", address, host.user);
        Ok(handle)
    }

    async fn run(
        handle: &Handle<ClientHandler>,
        address: &str,
        command: &str,
    ) -> Result<CommandOutput, ExecutionError> {
        let session_error = |source: russh::Error| ExecutionError::Session {
            address: address.to_string(),
            source,
        };

        let mut channel = handle
            .channel_open_session()
            .await
            .map_err(session_error)?;
        channel.exec(true, command).await.map_err(session_error)?;

        let mut output = CommandOutput {
            stdout: Vec::with_capacity(STDOUT_BUFFER_SIZE),
            stderr: Vec::with_capacity(STDERR_BUFFER_SIZE),
            ..Default::default()
        };

        // ExitStatus can arrive before the last Data message, so keep reading
        // until the channel closes.
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.push(OutputStream::Stdout, data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                    output.push(OutputStream::Stderr, data)
                }
                ChannelMsg::ExitStatus { exit_status } => output.exit_status = Some(exit_status),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    output.exit_signal = Some(format!("{signal_name:?}"))
                }
                _ => {}
            }
        }

        Ok(output)
    }
}

#[async_trait]
impl RemoteExecutor<SshCredentials> for SshExecutor {
    async fn execute(
        &self,
        host: &Host,
        credentials: &SshCredentials,
        command: &str,
    ) -> Result<CommandOutput, ExecutionError> {
        let address = host.address();

        let handle = within(self.connect_timeout, self.connect(host, credentials))
            .await
            .map_err(|seconds| ExecutionError::ConnectTimeout {
                address: address.clone(),
                seconds,
            })??;

        let result = within(self.command_timeout, Self::run(&handle, &address, command))
            .await
            .map_err(|seconds| ExecutionError::CommandTimeout {
                address: address.clone(),
                seconds,
            })
            .and_then(|output| output);

        if let Err(e) = handle
            .disconnect(russh::Disconnect::ByApplication, "", "English")
            .await
        {
            tracing::trace!("Disconnect from {} failed: {}", address, e);
        }

        let output = result?;
        tracing::debug!(
            "{} finished with status {:?} ({} bytes stdout, {} bytes stderr)",
            address,
            output.exit_status,
            output.stdout.len(),
            output.stderr.len()
        );
        Ok(output)
    }
}

/// Await `fut`, giving up after `limit`. The error carries the limit in seconds.
async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Result<F::Output, u64> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| limit.as_secs()),
        None => Ok(fut.await),
    }
}
