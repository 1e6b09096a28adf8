//! Process execution helpers for solship.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::UtilError;

/// Structured output from a command execution.
#[derive(Debug)]
pub struct CommandOutput {
    /// Standard output as a string.
    pub stdout: String,
    /// Standard error as a string.
    pub stderr: String,
    /// Whether the command exited successfully.
    pub success: bool,
    /// The exit code, if the process was not killed by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Stdout followed by stderr, trimmed. Useful for error messages.
    pub fn combined_trimmed(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (false, false) => format!("{stdout}\n{stderr}"),
            (false, true) => stdout.to_owned(),
            (true, _) => stderr.to_owned(),
        }
    }
}

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

/// Execute a command and capture its output.
///
/// # Errors
/// Returns an error if the command cannot be spawned (e.g. binary not found).
/// A non-zero exit code is **not** an error; check `CommandOutput::success` instead.
pub fn run_command(cmd: &mut Command) -> Result<CommandOutput, UtilError> {
    let output = cmd.output().map_err(|source| UtilError::CommandExec {
        program: program_name(cmd),
        source,
    })?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        success: output.status.success(),
        exit_code: output.status.code(),
    })
}

/// Execute a command with `input` written to its stdin, capturing its output.
///
/// # Errors
/// Returns an error if the command cannot be spawned or stdin cannot be written.
pub fn run_command_with_stdin(cmd: &mut Command, input: &str) -> Result<CommandOutput, UtilError> {
    let program = program_name(cmd);
    let exec_err = |source| UtilError::CommandExec {
        program: program.clone(),
        source,
    };

    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(exec_err)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).map_err(exec_err)?;
    }

    let output = child.wait_with_output().map_err(exec_err)?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        success: output.status.success(),
        exit_code: output.status.code(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn run_command_success() {
        let output = run_command(Command::new("echo").arg("hello")).unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.exit_code, Some(0));
    }

    #[test]
    fn run_command_failure() {
        let output = run_command(&mut Command::new("false")).unwrap();
        assert!(!output.success);
        assert_ne!(output.exit_code, Some(0));
    }

    #[test]
    fn run_command_missing_binary() {
        let err = run_command(&mut Command::new("nonexistent_binary_xyz_123"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("nonexistent_binary_xyz_123"), "error was: {err}");
    }

    #[test]
    fn run_command_with_stdin_pipes_input() {
        let output = run_command_with_stdin(&mut Command::new("cat"), "/deploy/App.ipa").unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, "/deploy/App.ipa");
    }

    #[test]
    fn combined_output_joins_streams() {
        let output = run_command(Command::new("sh").arg("-c").arg("echo out; echo err >&2")).unwrap();
        assert_eq!(output.combined_trimmed(), "out\nerr");
    }
}
