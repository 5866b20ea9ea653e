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

//! Overall result of a run and its process exit code.

use crate::cancel::Interrupt;

/// Tally produced by draining a task scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Hosts dispatched.
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Set when the drain stopped on a signal.
    pub interrupted: Option<Interrupt>,
}

impl ExecutionOutcome {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Hosts that never reported before the drain stopped.
    pub fn unreported(&self) -> usize {
        self.total - self.succeeded - self.failed
    }

    /// `128 + signo` when interrupted, 1 when any host failed, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self.interrupted {
            Some(interrupt) => interrupt.exit_code(),
            None if self.failed > 0 => 1,
            None => 0,
        }
    }
}
