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

//! Cluster definitions: the in-memory model, its parsers and file loading.

mod loader;
mod parser;
#[cfg(test)]
mod tests;
mod types;
mod utils;

// Re-export public types
pub use loader::{load_definition, DefinitionFormat, DEFAULT_DEFINITION_FILE};
pub use parser::{parse_cluster_file, parse_host_line, parse_structured};
pub use types::{Cluster, ClusterMap, ParseDefaults};
pub use utils::{expand_tilde, get_current_username, home_dir};
