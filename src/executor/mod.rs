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

//! Concurrent execution of one command across a cluster.

mod aggregator;
mod dispatcher;
mod outcome;
mod output;
mod result_types;

pub use aggregator::{Aggregator, PROGRAM_NAME};
pub use dispatcher::{Dispatcher, TaskScope};
pub use outcome::ExecutionOutcome;
pub use output::{render_body, render_header, should_use_colors, BODY_INDENT};
pub use result_types::TaskResult;
