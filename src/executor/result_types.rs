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

//! Result types for per-host tasks.

use crate::error::TaskError;
use crate::host::Host;
use crate::ssh::CommandOutput;

/// What one host task reported back to the aggregator.
#[derive(Debug)]
pub enum TaskResult {
    Success { host: Host, output: CommandOutput },
    Failure { host: Host, error: TaskError },
}

impl TaskResult {
    pub fn host(&self) -> &Host {
        match self {
            TaskResult::Success { host, .. } | TaskResult::Failure { host, .. } => host,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success { .. })
    }
}
