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
use clap::Parser;
use std::io;

use cl::{
    cancel::CancellationController,
    cli::Cli,
    commands::{exec::execute_command, list::list_clusters},
    config::{load_definition, ParseDefaults},
    executor::{should_use_colors, Aggregator, Dispatcher, PROGRAM_NAME},
    ssh::{default_known_hosts_path, CriticalSection, KeyFileProvider, SshExecutor},
    utils::init_logging,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{PROGRAM_NAME}: {e:#}");
            1
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let defaults = ParseDefaults::from_env()?
        .with_user(cli.user.clone())
        .with_identity(cli.identity.as_deref());
    tracing::debug!(
        "Host defaults: user={}, identity={}",
        defaults.user,
        defaults.identity.display()
    );

    let clusters = load_definition(&cli.file, &defaults).await?;
    let colors = should_use_colors();

    if cli.list {
        list_clusters(&clusters, colors);
        return Ok(0);
    }

    // clap enforces both unless --list is given.
    let cluster_name = cli.cluster.as_deref().unwrap_or_default();
    let command = cli.command_line();

    let provider = CriticalSection::new(KeyFileProvider::new(
        default_known_hosts_path(&defaults.home),
        cli.strict_host_key_checking,
    ));
    let executor = SshExecutor::new(cli.connect_timeout, cli.timeout);
    let dispatcher = Dispatcher::new(provider, executor);

    let cancel = CancellationController::new();
    let listener = cancel
        .listen_for_signals()
        .context("Failed to install signal handlers")?;

    let mut aggregator = Aggregator::new(io::stdout(), io::stderr()).with_colors(colors);
    let outcome = execute_command(
        &clusters,
        cluster_name,
        &command,
        &dispatcher,
        &mut aggregator,
        &cancel,
    )
    .await;
    listener.abort();

    Ok(outcome?.exit_code())
}
