//! Azure CLI command execution.

use colored::Colorize;
use regex::Regex;
use std::error::Error;
use std::process::Command;
use std::sync::OnceLock;

/// Largest stdout accepted from a single `az` call.
const MAX_STDOUT_BYTES: usize = 2_000_000;

static ARG_REGEX: OnceLock<Regex> = OnceLock::new();

fn arg_regex() -> &'static Regex {
    ARG_REGEX.get_or_init(|| {
        Regex::new(r#"'([^']*)'\s*|\"([^\"]*)\"\s*|([^'\s]*)\s*"#).expect("Invalid Regex")
    })
}

/// Run a command line and return its stdout.
///
/// Arguments are split on whitespace, single or double quoted substrings
/// (such as a graph query) stay one argument.
pub fn run(cmd: &str) -> Result<String, Box<dyn Error>> {
    log::debug!("run({cmd})", cmd = cmd.on_blue());

    let args = split_args(cmd);
    log::trace!("split args={:?}", args);

    let (program, rest) = args
        .split_first()
        .ok_or_else(|| format!("Empty command line: '{cmd}'"))?;

    let output = Command::new(program).args(rest).output().map_err(|e| {
        log::error!("Command execution failed: {}", e);
        format!("Failed to execute {program}: {e}")
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::trace!(
            "code={code:?}, status={status}\n┎######\nstderr=\n{stderr}\n┖######",
            code = output.status.code(),
            status = output.status,
            stderr = stderr.red()
        );
        log::warn!(
            "{failed} to run {program}",
            failed = "failed".on_red(),
            program = program.on_blue()
        );
        return Err(format!("ERROR running {program}: {stderr}").into());
    }

    log::debug!(
        "Success {program}: stdout.len()={} code={:?}",
        output.stdout.len(),
        output.status.code()
    );
    if output.stdout.len() > MAX_STDOUT_BYTES {
        return Err(format!(
            "Response too large: {} bytes from {program}",
            output.stdout.len()
        )
        .into());
    }

    let stdout = String::from_utf8(output.stdout).map_err(|e| format!("Invalid UTF-8: {}", e))?;
    Ok(stdout)
}

/// Split a command line on spaces, keeping quoted substrings together.
fn split_args(input: &str) -> Vec<&str> {
    arg_regex()
        .find_iter(input)
        .map(|m| m.as_str().trim().trim_matches('\'').trim_matches('"'))
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_args_quoted_query() {
        let input = "az graph query --first 100 -q 'resources | where type == \"x\" | limit 5' --output json";
        assert_eq!(
            split_args(input),
            vec![
                "az",
                "graph",
                "query",
                "--first",
                "100",
                "-q",
                "resources | where type == \"x\" | limit 5",
                "--output",
                "json"
            ]
        );
    }

    #[test]
    fn test_split_args_extra_spaces() {
        assert_eq!(split_args("  az   account show "), vec!["az", "account", "show"]);
    }

    #[test]
    fn test_run_empty_command() {
        assert!(run("   ").is_err());
    }

    #[test]
    fn test_run_echo() {
        let out = run("echo 'nsg rules'").expect("echo should run");
        assert_eq!(out.trim(), "nsg rules");
    }
}
