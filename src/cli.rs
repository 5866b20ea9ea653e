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

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_DEFINITION_FILE;
use crate::ssh::StrictHostKeyChecking;

#[derive(Parser, Debug)]
#[command(
    name = "cl",
    version,
    about = "Run one command on every host of a named cluster, concurrently",
    long_about = "cl runs a shell command over SSH on every host of a cluster defined in a ClFile.\nEach host's output is printed as soon as that host finishes, indented under a\nheader naming the host. Hosts that cannot be reached are reported and counted\nbut never stop the others.\n\nExit codes: 0 (all hosts ran the command), 1 (any host failed or setup error),\n128+N when interrupted by signal N.",
    after_help = "EXAMPLES:\n  Check load on production:     cl prod uptime\n  Use another definition file:  cl -f clusters.yaml uat 'df -h /'\n  Show defined clusters:        cl --list\n\nClFile format:\n  prod:\n      web1.example.com\n      deploy@web2.example.com:2222 ~/.ssh/deploy_key"
)]
pub struct Cli {
    #[arg(
        required_unless_present = "list",
        help = "Cluster name from the definition file"
    )]
    pub cluster: Option<String>,

    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "list",
        help = "Command to run; remaining arguments are joined with spaces"
    )]
    pub command: Vec<String>,

    #[arg(
        short = 'f',
        long,
        default_value = DEFAULT_DEFINITION_FILE,
        help = "Cluster definition file (.yaml/.yml is read as YAML)"
    )]
    pub file: PathBuf,

    #[arg(
        short = 'u',
        long,
        help = "Default user for hosts that do not name one [default: current user]"
    )]
    pub user: Option<String>,

    #[arg(
        short = 'i',
        long,
        help = "Default identity file for hosts that do not name one [default: ~/.ssh/id_rsa]"
    )]
    pub identity: Option<PathBuf>,

    #[arg(
        long,
        default_value = "300",
        help = "Command timeout in seconds (0 for unlimited)"
    )]
    pub timeout: u64,

    #[arg(
        long,
        default_value = "30",
        help = "Connection and authentication timeout in seconds (0 for unlimited)"
    )]
    pub connect_timeout: u64,

    #[arg(
        long,
        value_enum,
        default_value_t = StrictHostKeyChecking::AcceptNew,
        help = "Host key checking mode\n  yes        - Reject hosts missing from known_hosts\n  no         - Accept all host keys (insecure, testing only)\n  accept-new - Accept unknown hosts, reject changed keys"
    )]
    pub strict_host_key_checking: StrictHostKeyChecking,

    #[arg(long, help = "List the clusters in the definition file and exit")]
    pub list: bool,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}

impl Cli {
    /// The remote command line: trailing arguments joined with single spaces.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_and_trailing_command() {
        let cli = Cli::try_parse_from(["cl", "prod", "ls", "-la", "/var/log"]).unwrap();
        assert_eq!(cli.cluster.as_deref(), Some("prod"));
        assert_eq!(cli.command_line(), "ls -la /var/log");
        assert_eq!(cli.file, PathBuf::from("ClFile"));
        assert_eq!(cli.timeout, 300);
        assert_eq!(cli.connect_timeout, 30);
        assert_eq!(
            cli.strict_host_key_checking,
            StrictHostKeyChecking::AcceptNew
        );
    }

    #[test]
    fn test_options_before_cluster() {
        let cli = Cli::try_parse_from([
            "cl",
            "-f",
            "fleet.yaml",
            "-u",
            "deploy",
            "--strict-host-key-checking",
            "yes",
            "-vv",
            "uat",
            "uptime",
        ])
        .unwrap();
        assert_eq!(cli.file, PathBuf::from("fleet.yaml"));
        assert_eq!(cli.user.as_deref(), Some("deploy"));
        assert_eq!(cli.strict_host_key_checking, StrictHostKeyChecking::Yes);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command_line(), "uptime");
    }

    #[test]
    fn test_command_is_required_without_list() {
        assert!(Cli::try_parse_from(["cl", "prod"]).is_err());
        assert!(Cli::try_parse_from(["cl"]).is_err());

        let cli = Cli::try_parse_from(["cl", "--list"]).unwrap();
        assert!(cli.list);
        assert!(cli.cluster.is_none());
    }
}
