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

use owo_colors::OwoColorize;
use std::fmt::Write;

use crate::config::ClusterMap;

/// Render every cluster with its host count and hosts in definition order.
pub fn format_cluster_listing(clusters: &ClusterMap, colors: bool) -> String {
    let mut out = String::new();

    if clusters.is_empty() {
        let message = "No clusters defined";
        if colors {
            let _ = writeln!(out, "{}", message.dimmed());
        } else {
            let _ = writeln!(out, "{message}");
        }
        return out;
    }

    for cluster in clusters.iter() {
        let name = &cluster.name;
        let count = cluster.hosts.len();
        let noun = if count == 1 { "host" } else { "hosts" };
        if colors {
            let _ = writeln!(
                out,
                "{} ({} {})",
                name.bold(),
                count.to_string().yellow(),
                noun
            );
        } else {
            let _ = writeln!(out, "{name} ({count} {noun})");
        }

        for host in &cluster.hosts {
            let line = format!("{host}  {}", host.identity.display());
            if colors {
                let _ = writeln!(out, "  {}", line.dimmed());
            } else {
                let _ = writeln!(out, "  {line}");
            }
        }
    }

    out
}

pub fn list_clusters(clusters: &ClusterMap, colors: bool) {
    print!("{}", format_cluster_listing(clusters, colors));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_cluster_file, ParseDefaults};

    #[test]
    fn test_listing_plain() {
        let defaults = ParseDefaults::new("ops", "/home/ops");
        let source = "web:\n  web1\n  root@web2:2200 /k\ndb:\n  db1\nidle:\n";
        let clusters = parse_cluster_file(source, &defaults).unwrap();

        assert_eq!(
            format_cluster_listing(&clusters, false),
            "db (1 host)\n\
             \x20 ops@db1:22  /home/ops/.ssh/id_rsa\n\
             idle (0 hosts)\n\
             web (2 hosts)\n\
             \x20 ops@web1:22  /home/ops/.ssh/id_rsa\n\
             \x20 root@web2:2200  /k\n"
        );
    }

    #[test]
    fn test_listing_empty() {
        assert_eq!(
            format_cluster_listing(&ClusterMap::new(), false),
            "No clusters defined\n"
        );
    }
}
