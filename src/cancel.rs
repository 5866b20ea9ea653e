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

//! Run cancellation.
//!
//! A [`CancellationController`] moves from running to cancelled exactly
//! once. The first interrupt recorded wins; later ones are ignored.

use std::io;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Why a run was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// SIGHUP
    Hangup,
}

impl Interrupt {
    pub fn signal_number(self) -> i32 {
        match self {
            Interrupt::Hangup => 1,
            Interrupt::Interrupt => 2,
            Interrupt::Terminate => 15,
        }
    }

    /// Shell convention: `128 + signo`.
    pub fn exit_code(self) -> i32 {
        128 + self.signal_number()
    }

    pub fn name(self) -> &'static str {
        match self {
            Interrupt::Interrupt => "SIGINT",
            Interrupt::Terminate => "SIGTERM",
            Interrupt::Hangup => "SIGHUP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelState {
    Running,
    Cancelled(Interrupt),
}

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationController {
    token: CancellationToken,
    reason: Arc<OnceLock<Interrupt>>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the run. Returns false if it was already cancelled.
    pub fn cancel(&self, interrupt: Interrupt) -> bool {
        // Reason must be visible before waiters wake.
        if self.reason.set(interrupt).is_err() {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn state(&self) -> CancelState {
        match self.reason.get() {
            Some(interrupt) => CancelState::Cancelled(*interrupt),
            None => CancelState::Running,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason.get().is_some()
    }

    /// Wait until the run is cancelled and return why.
    pub async fn cancelled(&self) -> Interrupt {
        self.token.cancelled().await;
        self.reason.get().copied().unwrap_or(Interrupt::Interrupt)
    }

    /// Spawn a task that cancels this controller on the first termination signal.
    ///
    /// Abort the returned handle once the run is over.
    pub fn listen_for_signals(&self) -> io::Result<JoinHandle<()>> {
        let controller = self.clone();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sighup = signal(SignalKind::hangup())?;

            Ok(tokio::spawn(async move {
                let interrupt = tokio::select! {
                    _ = sigint.recv() => Interrupt::Interrupt,
                    _ = sigterm.recv() => Interrupt::Terminate,
                    _ = sighup.recv() => Interrupt::Hangup,
                };
                info!("Received {}", interrupt.name());
                controller.cancel(interrupt);
            }))
        }

        #[cfg(not(unix))]
        {
            Ok(tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received Ctrl+C");
                    controller.cancel(Interrupt::Interrupt);
                }
            }))
        }
    }
}
