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

//! Rendering of host result blocks.
//!
//! Each block is built in memory and handed to the writer in one call, so
//! a host's lines are never split by another host's.

use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::host::Host;
use crate::ssh::CommandOutput;

/// Prefix for every body line.
pub const BODY_INDENT: &str = "  ";

/// `Host: <address>`, plus `(exit N)` or `(signal S)` when the command did
/// not exit cleanly.
pub fn render_header(host: &Host, output: &CommandOutput, colors: bool) -> Vec<u8> {
    let mut status = String::new();
    match (&output.exit_signal, output.exit_status) {
        (Some(signal), _) => status = format!(" (signal {signal})"),
        (None, Some(code)) if code != 0 => status = format!(" (exit {code})"),
        _ => {}
    }

    let line = if colors {
        if status.is_empty() {
            format!("Host: {}\n", host.address().bold())
        } else {
            format!("Host: {}{}\n", host.address().bold(), status.red())
        }
    } else {
        format!("Host: {}{}\n", host.address(), status)
    };
    line.into_bytes()
}

/// Indent every output line in arrival order across both streams.
///
/// A line cut off by output on the other stream, or by the end of output,
/// is terminated with a newline.
pub fn render_body(output: &CommandOutput) -> Vec<u8> {
    let mut buf = Vec::with_capacity(output.stdout.len() + output.stderr.len() + 64);
    for (_, bytes) in output.segments() {
        indent_into(&mut buf, bytes);
    }
    buf
}

fn indent_into(buf: &mut Vec<u8>, bytes: &[u8]) {
    for line in bytes.split_inclusive(|&b| b == b'\n') {
        buf.extend_from_slice(BODY_INDENT.as_bytes());
        buf.extend_from_slice(line);
        if !line.ends_with(b"\n") {
            buf.push(b'\n');
        }
    }
}

/// `cl: <address>: <error>` for a failed host.
pub fn render_failure(
    program: &str,
    host: &Host,
    error: &dyn std::fmt::Display,
    colors: bool,
) -> Vec<u8> {
    let line = if colors {
        format!("{program}: {}: {}\n", host.address().bold(), error.red())
    } else {
        format!("{program}: {}: {error}\n", host.address())
    };
    line.into_bytes()
}

/// Colors on when stderr is a terminal, `NO_COLOR` is unset and `TERM` is not `dumb`.
pub fn should_use_colors() -> bool {
    if !std::io::stderr().is_terminal() {
        return false;
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh::OutputStream;

    fn host() -> Host {
        Host::new("deploy", "web1", 22, "/k")
    }

    fn output(stdout: &str, stderr: &str, status: Option<u32>) -> CommandOutput {
        CommandOutput {
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            exit_status: status,
            ..Default::default()
        }
    }

    #[test]
    fn test_header() {
        let ok = output("", "", Some(0));
        assert_eq!(render_header(&host(), &ok, false), b"Host: web1:22\n");

        let failed = output("", "", Some(3));
        assert_eq!(
            render_header(&host(), &failed, false),
            b"Host: web1:22 (exit 3)\n"
        );

        let mut killed = output("", "", None);
        killed.exit_signal = Some("KILL".to_string());
        assert_eq!(
            render_header(&host(), &killed, false),
            b"Host: web1:22 (signal KILL)\n"
        );
    }

    #[test]
    fn test_body_indents_stdout_then_stderr() {
        let out = output("one\ntwo\n", "warn\n", Some(0));
        assert_eq!(
            String::from_utf8(render_body(&out)).unwrap(),
            "  one\n  two\n  warn\n"
        );
    }

    #[test]
    fn test_body_keeps_arrival_order_across_streams() {
        let mut out = CommandOutput::default();
        out.push(OutputStream::Stdout, b"step1\n");
        out.push(OutputStream::Stderr, b"warn1\n");
        out.push(OutputStream::Stdout, b"step2\n");
        assert_eq!(
            String::from_utf8(render_body(&out)).unwrap(),
            "  step1\n  warn1\n  step2\n"
        );
    }

    #[test]
    fn test_body_splits_line_interrupted_by_other_stream() {
        let mut out = CommandOutput::default();
        out.push(OutputStream::Stdout, b"progress ");
        out.push(OutputStream::Stderr, b"warning\n");
        out.push(OutputStream::Stdout, b"done\n");
        assert_eq!(render_body(&out), b"  progress \n  warning\n  done\n");
    }

    #[test]
    fn test_failure_line_names_address_once() {
        let err = crate::error::ExecutionError::ConnectTimeout {
            address: "web1:22".to_string(),
            seconds: 30,
        };
        let line = render_failure("cl", &host(), &err, false);
        assert_eq!(line, b"cl: web1:22: connection timed out after 30s\n");
    }

    #[test]
    fn test_body_terminates_partial_line() {
        let out = output("a\nno newline", "", Some(0));
        assert_eq!(render_body(&out), b"  a\n  no newline\n");
        assert!(render_body(&output("", "", Some(0))).is_empty());
    }

    #[test]
    fn test_body_keeps_blank_lines_and_raw_bytes() {
        let mut out = output("\n\nx\n", "", Some(0));
        out.stdout.extend_from_slice(&[0xff, b'\n']);
        assert_eq!(render_body(&out), b"  \n  \n  x\n  \xff\n");
    }

    #[test]
    fn test_failure_line() {
        let line = render_failure("cl", &host(), &"connection refused", false);
        assert_eq!(line, b"cl: web1:22: connection refused\n");
    }
}
