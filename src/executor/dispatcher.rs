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

//! Fan-out of one task per host.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{Id, JoinError, JoinSet};

use crate::error::TaskError;
use crate::host::Host;
use crate::ssh::{CommandOutput, CredentialProvider, RemoteExecutor};

use super::result_types::TaskResult;

/// Launches a task per host that resolves credentials and runs the command.
pub struct Dispatcher<P, E> {
    provider: Arc<P>,
    executor: Arc<E>,
}

impl<P, E> Dispatcher<P, E>
where
    P: CredentialProvider,
    E: RemoteExecutor<P::Credentials>,
{
    pub fn new(provider: P, executor: E) -> Self {
        Self::from_shared(Arc::new(provider), Arc::new(executor))
    }

    pub fn from_shared(provider: Arc<P>, executor: Arc<E>) -> Self {
        Self { provider, executor }
    }

    /// Spawn every host task onto the current runtime. Nothing is awaited here.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn dispatch(&self, hosts: &[Host], command: &str) -> TaskScope {
        let command: Arc<str> = Arc::from(command);
        let mut scope = TaskScope::default();

        for host in hosts.iter().cloned() {
            let provider = Arc::clone(&self.provider);
            let executor = Arc::clone(&self.executor);
            let command = Arc::clone(&command);
            let key = host.clone();

            let handle = scope.tasks.spawn(async move {
                match run_host(provider.as_ref(), executor.as_ref(), &host, &command).await {
                    Ok(output) => TaskResult::Success { host, output },
                    Err(error) => TaskResult::Failure { host, error },
                }
            });
            scope.hosts.insert(handle.id(), key);
        }

        tracing::debug!("Dispatched {} host tasks", scope.hosts.len());
        scope
    }
}

async fn run_host<P, E>(
    provider: &P,
    executor: &E,
    host: &Host,
    command: &str,
) -> Result<CommandOutput, TaskError>
where
    P: CredentialProvider,
    E: RemoteExecutor<P::Credentials>,
{
    tracing::debug!("Resolving credentials for {}", host);
    let credentials = provider.resolve(host).await?;

    tracing::debug!("Executing on {}", host);
    Ok(executor.execute(host, &credentials, command).await?)
}

/// The set of in-flight host tasks.
///
/// Completes by count: [`next`](Self::next) yields exactly one result per
/// dispatched host, in completion order. Dropping the scope aborts whatever
/// is still running; [`abandon`](Self::abandon) detaches it instead.
#[derive(Default)]
pub struct TaskScope {
    tasks: JoinSet<TaskResult>,
    hosts: HashMap<Id, Host>,
}

impl TaskScope {
    /// Hosts that have not reported yet.
    pub fn remaining(&self) -> usize {
        self.hosts.len()
    }

    /// Next completed host result, or `None` once every host has reported.
    ///
    /// Cancel-safe: a result is only removed from the set when returned.
    pub async fn next(&mut self) -> Option<TaskResult> {
        if self.hosts.is_empty() {
            return None;
        }

        while let Some(joined) = self.tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    self.hosts.remove(&id);
                    return Some(result);
                }
                Err(e) => {
                    if let Some(host) = self.hosts.remove(&e.id()) {
                        return Some(TaskResult::Failure {
                            host,
                            error: TaskError::Panicked(panic_message(e)),
                        });
                    }
                }
            }
        }
        None
    }

    /// Detach every task that has not reported. Returns how many there were.
    pub fn abandon(&mut self) -> usize {
        let abandoned = self.hosts.len();
        self.tasks.detach_all();
        self.hosts.clear();
        abandoned
    }
}

fn panic_message(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CredentialError, ExecutionError};
    use async_trait::async_trait;

    struct StaticProvider;

    #[async_trait]
    impl CredentialProvider for StaticProvider {
        type Credentials = ();

        async fn resolve(&self, host: &Host) -> Result<(), CredentialError> {
            if host.hostname == "nokey" {
                return Err(CredentialError::Other("no key".to_string()));
            }
            Ok(())
        }
    }

    struct EchoExecutor;

    #[async_trait]
    impl RemoteExecutor<()> for EchoExecutor {
        async fn execute(
            &self,
            host: &Host,
            _credentials: &(),
            command: &str,
        ) -> Result<CommandOutput, ExecutionError> {
            match host.hostname.as_str() {
                "boom" => panic!("executor exploded"),
                "down" => Err(ExecutionError::Other("unreachable".to_string())),
                _ => Ok(CommandOutput {
                    stdout: format!("{}: {command}\n", host.hostname).into_bytes(),
                    exit_status: Some(0),
                    ..Default::default()
                }),
            }
        }
    }

    fn hosts(names: &[&str]) -> Vec<Host> {
        names
            .iter()
            .map(|name| Host::new("u", *name, 22, "/k"))
            .collect()
    }

    #[tokio::test]
    async fn test_one_result_per_host() {
        let dispatcher = Dispatcher::new(StaticProvider, EchoExecutor);
        let mut scope = dispatcher.dispatch(&hosts(&["a", "b", "nokey", "down"]), "uptime");
        assert_eq!(scope.remaining(), 4);

        let mut seen = Vec::new();
        while let Some(result) = scope.next().await {
            seen.push((result.host().hostname.clone(), result.is_success()));
        }
        seen.sort();
        assert_eq!(
            seen,
            [
                ("a".to_string(), true),
                ("b".to_string(), true),
                ("down".to_string(), false),
                ("nokey".to_string(), false),
            ]
        );
        assert_eq!(scope.remaining(), 0);
    }

    #[tokio::test]
    async fn test_panicking_task_is_a_failure() {
        let dispatcher = Dispatcher::new(StaticProvider, EchoExecutor);
        let mut scope = dispatcher.dispatch(&hosts(&["boom"]), "true");

        match scope.next().await {
            Some(TaskResult::Failure {
                host,
                error: TaskError::Panicked(message),
            }) => {
                assert_eq!(host.hostname, "boom");
                assert_eq!(message, "executor exploded");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(scope.next().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_dispatch() {
        let dispatcher = Dispatcher::new(StaticProvider, EchoExecutor);
        let mut scope = dispatcher.dispatch(&[], "true");
        assert!(scope.next().await.is_none());
        assert_eq!(scope.abandon(), 0);
    }
}
