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

//! Fan-in of host results into the output streams.

use std::io::{self, Write};
use tracing::{debug, info};

use crate::cancel::CancellationController;

use super::dispatcher::TaskScope;
use super::outcome::ExecutionOutcome;
use super::output::{render_body, render_failure, render_header};
use super::result_types::TaskResult;

/// Prefix for diagnostics written by the aggregator.
pub const PROGRAM_NAME: &str = "cl";

/// Drains a [`TaskScope`], rendering each result as it completes.
///
/// Headers and diagnostics go to `err`, host output bodies to `out`.
pub struct Aggregator<O, E> {
    out: O,
    err: E,
    colors: bool,
}

impl<O: Write, E: Write> Aggregator<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            colors: false,
        }
    }

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Render results until every host has reported or `cancel` fires.
    ///
    /// On cancellation the unreported tasks are detached and a diagnostic
    /// naming the signal is written.
    pub async fn drain(
        &mut self,
        mut scope: TaskScope,
        cancel: &CancellationController,
    ) -> io::Result<ExecutionOutcome> {
        let mut outcome = ExecutionOutcome::new(scope.remaining());

        loop {
            tokio::select! {
                biased;

                interrupt = cancel.cancelled() => {
                    let abandoned = scope.abandon();
                    info!("Cancelled by {}, detached {} host tasks", interrupt.name(), abandoned);
                    writeln!(
                        self.err,
                        "{PROGRAM_NAME}: cancelled by {}; {abandoned} of {} hosts did not report",
                        interrupt.name(),
                        outcome.total,
                    )?;
                    self.err.flush()?;
                    outcome.interrupted = Some(interrupt);
                    break;
                }

                next = scope.next() => match next {
                    Some(result) => self.render(result, &mut outcome)?,
                    None => break,
                },
            }
        }

        debug!(
            "Run finished: {} hosts, {} succeeded, {} failed, {} unreported",
            outcome.total,
            outcome.succeeded,
            outcome.failed,
            outcome.unreported()
        );
        Ok(outcome)
    }

    fn render(&mut self, result: TaskResult, outcome: &mut ExecutionOutcome) -> io::Result<()> {
        match result {
            TaskResult::Success { host, output } => {
                outcome.succeeded += 1;
                self.err
                    .write_all(&render_header(&host, &output, self.colors))?;
                self.err.flush()?;
                self.out.write_all(&render_body(&output))?;
                self.out.flush()
            }
            TaskResult::Failure { host, error } => {
                outcome.failed += 1;
                debug!("{} failed: {:?}", host, error);
                self.err
                    .write_all(&render_failure(PROGRAM_NAME, &host, &error, self.colors))?;
                self.err.flush()
            }
        }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}
