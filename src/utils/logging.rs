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

use tracing_subscriber::EnvFilter;

/// Create an environment filter based on verbosity level
pub fn create_env_filter(verbosity: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        // RUST_LOG wins so russh internals can be inspected directly
        EnvFilter::from_default_env()
    } else {
        match verbosity {
            0 => EnvFilter::new("cl=warn"),
            1 => EnvFilter::new("cl=info"),
            // -vv: include russh debug logs for SSH troubleshooting
            2 => EnvFilter::new("cl=debug,russh=debug"),
            _ => EnvFilter::new("cl=trace,russh=trace"),
        }
    }
}

/// Initialize logging to stderr.
///
/// stdout carries host output only, so log lines never land in it.
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logging(verbosity: u8) {
    let filter = create_env_filter(verbosity);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn directives(filter: EnvFilter) -> Vec<String> {
        let mut parts: Vec<String> = filter
            .to_string()
            .to_lowercase()
            .split(',')
            .map(str::to_string)
            .collect();
        parts.sort();
        parts
    }

    #[test]
    #[serial]
    fn test_verbosity_filters() {
        std::env::remove_var("RUST_LOG");
        assert_eq!(directives(create_env_filter(0)), ["cl=warn"]);
        assert_eq!(directives(create_env_filter(1)), ["cl=info"]);
        assert_eq!(
            directives(create_env_filter(2)),
            ["cl=debug", "russh=debug"]
        );
        assert_eq!(
            directives(create_env_filter(7)),
            ["cl=trace", "russh=trace"]
        );
    }

    #[test]
    #[serial]
    fn test_rust_log_takes_precedence() {
        std::env::set_var("RUST_LOG", "russh=info");
        let filter = create_env_filter(3);
        std::env::remove_var("RUST_LOG");
        assert_eq!(directives(filter), ["russh=info"]);
    }
}
