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

//! Cluster definition parser tests.

use std::path::{Path, PathBuf};

use super::parser::{parse_cluster_file, parse_host_line, parse_structured};
use super::types::ParseDefaults;
use super::utils::expand_tilde;
use crate::error::{DefinitionError, HostLineError, HostSpecError};

fn defaults() -> ParseDefaults {
    ParseDefaults::new("operator", "/home/operator")
}

const CLFILE: &str = "
prod:
\tprod0.example.com ~/.ssh/id_ed25519
\tprod1.example.com ~/.ssh/id_ed25519
\tprod2.example.com ~/.ssh/id_ed25519
uat:
    uat0.example.com \t~/.ssh/id_rsa
    uat1.example.com \t  \t~/.ssh/id_rsa
    uat2.example.com   \t~/.ssh/id_rsa

# Comment line, this is ignored.
mixed:
\tmixed0.example.com
\t    mixed1.example.com:444
  mixed2.example.com
                  \t\t \t \t    mixed3.example.com \t\t \t \t   ~/.ssh/id_ed25519
";

#[test]
fn test_section_host_counts() {
    let clusters = parse_cluster_file(CLFILE, &defaults()).unwrap();

    let expected = [("prod", 3), ("uat", 3), ("mixed", 4)];
    assert_eq!(clusters.len(), expected.len());
    for (name, count) in expected {
        let cluster = clusters.get(name).unwrap();
        assert_eq!(cluster.hosts.len(), count, "host count for '{name}'");
    }
    assert_eq!(clusters.host_count(), 10);
}

#[test]
fn test_worked_example_fields() {
    let clusters = parse_cluster_file(CLFILE, &defaults()).unwrap();

    let prod = clusters.get("prod").unwrap();
    for (i, host) in prod.hosts.iter().enumerate() {
        assert_eq!(host.address(), format!("prod{i}.example.com:22"));
        assert_eq!(host.user, "operator");
        assert_eq!(
            host.identity,
            PathBuf::from("/home/operator/.ssh/id_ed25519")
        );
    }

    let mixed = &clusters.get("mixed").unwrap().hosts;
    assert_eq!(mixed[0].address(), "mixed0.example.com:22");
    assert_eq!(mixed[0].identity, PathBuf::from("/home/operator/.ssh/id_rsa"));
    assert_eq!(mixed[1].address(), "mixed1.example.com:444");
    assert_eq!(mixed[1].identity, PathBuf::from("/home/operator/.ssh/id_rsa"));
    assert_eq!(mixed[2].address(), "mixed2.example.com:22");
    assert_eq!(mixed[3].address(), "mixed3.example.com:22");
    assert_eq!(
        mixed[3].identity,
        PathBuf::from("/home/operator/.ssh/id_ed25519")
    );
}

#[test]
fn test_default_filling() {
    let host = parse_host_line("db.internal", &defaults()).unwrap();
    assert_eq!(host.user, "operator");
    assert_eq!(host.port, 22);
    assert_eq!(host.address(), "db.internal:22");
    assert_eq!(host.identity, PathBuf::from("/home/operator/.ssh/id_rsa"));
}

#[test]
fn test_full_override() {
    let host = parse_host_line("alice@host:2222 /tmp/key", &defaults()).unwrap();
    assert_eq!(host.user, "alice");
    assert_eq!(host.address(), "host:2222");
    assert_eq!(host.identity, PathBuf::from("/tmp/key"));
}

#[test]
fn test_custom_defaults_flow_through() {
    let defaults = defaults()
        .with_user(Some("deploy".to_string()))
        .with_identity(Some(Path::new("~/.ssh/fleet")));
    let host = parse_host_line("web1", &defaults).unwrap();
    assert_eq!(host.user, "deploy");
    assert_eq!(host.identity, PathBuf::from("/home/operator/.ssh/fleet"));
}

#[test]
fn test_host_before_header_is_rejected() {
    let source = "# stray host\norphan.example.com\nprod:\n  web1\n";
    let err = parse_cluster_file(source, &defaults()).unwrap_err();
    assert_eq!(
        err,
        DefinitionError::HostOutsideSection {
            line: 2,
            entry: "orphan.example.com".to_string(),
        }
    );
}

#[test]
fn test_too_many_fields_is_rejected() {
    let source = "prod:\n  web1 ~/.ssh/key extra\n";
    let err = parse_cluster_file(source, &defaults()).unwrap_err();
    assert_eq!(
        err,
        DefinitionError::InvalidHostLine {
            line: 2,
            source: HostLineError::TooManyFields { count: 3 },
        }
    );
}

#[test]
fn test_invalid_port_is_rejected() {
    let source = "prod:\n  web1:http\n";
    let err = parse_cluster_file(source, &defaults()).unwrap_err();
    assert!(matches!(
        err,
        DefinitionError::InvalidHostLine {
            line: 2,
            source: HostLineError::Spec(HostSpecError::InvalidPort { .. }),
        }
    ));
}

#[test]
fn test_invalid_header_is_rejected() {
    let err = parse_cluster_file("web servers:\n  web1\n", &defaults()).unwrap_err();
    assert!(matches!(err, DefinitionError::InvalidHeader { line: 1, .. }));

    let err = parse_cluster_file(":\n", &defaults()).unwrap_err();
    assert!(matches!(err, DefinitionError::InvalidHeader { line: 1, .. }));
}

#[test]
fn test_reopened_section_appends() {
    let source = "prod:\n  web1\nuat:\n  uat1\nprod:\n  web2\n";
    let clusters = parse_cluster_file(source, &defaults()).unwrap();
    let prod = clusters.get("prod").unwrap();
    let names: Vec<_> = prod.hosts.iter().map(|h| h.hostname.as_str()).collect();
    assert_eq!(names, ["web1", "web2"]);
}

#[test]
fn test_empty_section_and_empty_source() {
    let clusters = parse_cluster_file("empty:\n# nothing here\n", &defaults()).unwrap();
    assert!(clusters.get("empty").unwrap().hosts.is_empty());

    let clusters = parse_cluster_file("", &defaults()).unwrap();
    assert!(clusters.is_empty());
}

#[test]
fn test_unknown_cluster_lookup() {
    let clusters = parse_cluster_file(CLFILE, &defaults()).unwrap();
    let err = clusters.get("staging").unwrap_err();
    assert_eq!(err.name, "staging");
    assert_eq!(err.known, ["mixed", "prod", "uat"]);
}

#[test]
fn test_structured_definition_matches_line_format() {
    let yaml = r#"
prod:
  - prod0.example.com ~/.ssh/id_ed25519
  - prod1.example.com ~/.ssh/id_ed25519
  - prod2.example.com ~/.ssh/id_ed25519
mixed:
  - mixed0.example.com
  - mixed1.example.com:444
  - mixed2.example.com
  - "mixed3.example.com   ~/.ssh/id_ed25519"
empty:
"#;
    let structured = parse_structured(yaml, &defaults()).unwrap();
    let lines = parse_cluster_file(CLFILE, &defaults()).unwrap();

    assert_eq!(structured.get("prod"), lines.get("prod"));
    assert_eq!(structured.get("mixed"), lines.get("mixed"));
    assert!(structured.get("empty").unwrap().hosts.is_empty());
}

#[test]
fn test_structured_definition_errors() {
    let err = parse_structured("prod:\n  - web1:99999\n", &defaults()).unwrap_err();
    assert!(matches!(
        err,
        DefinitionError::InvalidClusterEntry { ref cluster, index: 0, .. } if cluster == "prod"
    ));

    let err = parse_structured("prod: 42\n", &defaults()).unwrap_err();
    assert!(matches!(err, DefinitionError::Structured(_)));

    assert!(parse_structured("", &defaults()).unwrap().is_empty());
}

#[test]
fn test_expand_tilde() {
    let home = Path::new("/home/user");
    assert_eq!(
        expand_tilde("~/.ssh/config", home),
        PathBuf::from("/home/user/.ssh/config")
    );
    assert_eq!(expand_tilde("~", home), PathBuf::from("/home/user"));
    assert_eq!(expand_tilde("/etc/key", home), PathBuf::from("/etc/key"));
    assert_eq!(
        expand_tilde("~other/key", home),
        PathBuf::from("/home/userother/key")
    );
    assert_eq!(expand_tilde("a/~/key", home), PathBuf::from("a/~/key"));
}
