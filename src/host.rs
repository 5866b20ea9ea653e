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

use std::fmt;
use std::path::PathBuf;

use crate::error::HostSpecError;

/// Port used when a host spec does not name one.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// One remote target with every connection field resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub user: String,
    pub hostname: String,
    pub port: u16,
    pub identity: PathBuf,
}

/// The parts of a `[user@]host[:port]` spec, before defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSpec {
    pub user: Option<String>,
    pub hostname: String,
    pub port: Option<u16>,
}

impl Host {
    pub fn new(
        user: impl Into<String>,
        hostname: impl Into<String>,
        port: u16,
        identity: impl Into<PathBuf>,
    ) -> Self {
        Self {
            user: user.into(),
            hostname: hostname.into(),
            port,
            identity: identity.into(),
        }
    }

    /// Canonical `host:port` form. IPv6 literals are bracketed.
    pub fn address(&self) -> String {
        if self.hostname.contains(':') {
            format!("[{}]:{}", self.hostname, self.port)
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.address())
    }
}

impl HostSpec {
    /// Parse `[user@]host[:port]`.
    ///
    /// The user is split off at the first `@`. A bare IPv6 literal (more than
    /// one `:` and no brackets) is taken whole as the hostname; use
    /// `[addr]:port` to give it a port.
    pub fn parse(spec: &str) -> Result<Self, HostSpecError> {
        let (user, rest) = match spec.split_once('@') {
            Some((user, rest)) => {
                if user.is_empty() {
                    return Err(HostSpecError::EmptyUser {
                        spec: spec.to_string(),
                    });
                }
                (Some(user.to_string()), rest)
            }
            None => (None, spec),
        };

        let (hostname, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let Some((host, after)) = bracketed.split_once(']') else {
                return Err(HostSpecError::UnterminatedBracket {
                    spec: spec.to_string(),
                });
            };
            match after.strip_prefix(':') {
                Some(port) => (host, Some(parse_port(spec, port)?)),
                None if after.is_empty() => (host, None),
                None => {
                    return Err(HostSpecError::InvalidPort {
                        spec: spec.to_string(),
                        port: after.to_string(),
                    })
                }
            }
        } else if rest.matches(':').count() > 1 {
            (rest, None)
        } else if let Some((host, port)) = rest.rsplit_once(':') {
            (host, Some(parse_port(spec, port)?))
        } else {
            (rest, None)
        };

        if hostname.is_empty() {
            return Err(HostSpecError::EmptyHost {
                spec: spec.to_string(),
            });
        }

        Ok(Self {
            user,
            hostname: hostname.to_string(),
            port,
        })
    }
}

fn parse_port(spec: &str, port: &str) -> Result<u16, HostSpecError> {
    port.parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| HostSpecError::InvalidPort {
            spec: spec.to_string(),
            port: port.to_string(),
        })
}
