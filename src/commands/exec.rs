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

use anyhow::{Context, Result};
use std::io::Write;

use crate::cancel::CancellationController;
use crate::config::ClusterMap;
use crate::executor::{Aggregator, Dispatcher, ExecutionOutcome};
use crate::ssh::{CredentialProvider, RemoteExecutor};

/// Run `command` on every host of `cluster_name` and render the results.
///
/// An unknown cluster is an error before any task is launched. Per-host
/// failures are reported through the aggregator and counted in the outcome.
pub async fn execute_command<P, E, O, W>(
    clusters: &ClusterMap,
    cluster_name: &str,
    command: &str,
    dispatcher: &Dispatcher<P, E>,
    aggregator: &mut Aggregator<O, W>,
    cancel: &CancellationController,
) -> Result<ExecutionOutcome>
where
    P: CredentialProvider,
    E: RemoteExecutor<P::Credentials>,
    O: Write,
    W: Write,
{
    let cluster = clusters.get(cluster_name)?;
    tracing::info!(
        "Running '{}' on {} hosts of cluster '{}'",
        command,
        cluster.hosts.len(),
        cluster.name
    );

    let scope = dispatcher.dispatch(&cluster.hosts, command);
    aggregator
        .drain(scope, cancel)
        .await
        .context("Failed to write command output")
}
