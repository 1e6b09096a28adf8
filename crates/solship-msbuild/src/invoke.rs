//! Build execution and build-log message extraction.

use std::process::Command;

use crate::command::BuildCommand;
use crate::error::DriverError;

/// Result of running one build command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Whether the tool exited successfully.
    pub success: bool,
    /// The exit code, if the process was not killed by a signal.
    pub exit_code: Option<i32>,
    /// Warning lines, deduplicated, in first-seen order.
    pub warnings: Vec<String>,
    /// Error lines, deduplicated, in first-seen order.
    pub errors: Vec<String>,
    /// Combined stdout and stderr.
    pub raw_output: String,
}

impl ExecutionReport {
    /// Human-readable summary.
    pub fn summary(&self) -> String {
        if self.success {
            match self.warnings.len() {
                0 => "build succeeded".to_owned(),
                n => format!("build succeeded with {n} warning(s)"),
            }
        } else {
            let code = self
                .exit_code
                .map_or_else(|| "signal".to_owned(), |c| c.to_string());
            format!(
                "build failed with {} error(s) (exit status {code})",
                self.errors.len()
            )
        }
    }

    /// The last `n` lines of output, for failure messages.
    pub fn output_tail(&self, n: usize) -> String {
        let lines: Vec<&str> = self.raw_output.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines.get(start..).unwrap_or_default().join("\n")
    }
}

/// Run `command` to completion, capturing its output.
///
/// # Errors
/// Returns `DriverError::Exec` if the tool cannot be started. A failing build
/// is reported through `ExecutionReport::success`, not as an error.
pub fn execute(command: &BuildCommand) -> Result<ExecutionReport, DriverError> {
    let mut cmd = Command::new(command.program_name());
    cmd.args(command.args());
    if let Some(dir) = command.working_dir() {
        cmd.current_dir(dir);
    }

    let output = solship_util::process::run_command(&mut cmd).map_err(|e| match e {
        solship_util::error::UtilError::CommandExec { program, source } => {
            DriverError::Exec { program, source }
        }
        other => DriverError::Util(other),
    })?;

    let raw_output = output.combined_trimmed();
    let (warnings, errors) = parse_messages(&raw_output);

    Ok(ExecutionReport {
        success: output.success,
        exit_code: output.exit_code,
        warnings,
        errors,
        raw_output,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageLevel {
    Warning,
    Error,
}

/// Split build output into warning and error lines.
///
/// Recognizes the msbuild/csc format `file(12,5): warning CS0168: text [proj]`
/// as well as bare `warning MSB3277: text` / `error: text` lines. Repeated
/// lines (msbuild echoes every message again in its summary) are kept once.
pub fn parse_messages(output: &str) -> (Vec<String>, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let bucket = match classify(trimmed) {
            Some(MessageLevel::Warning) => &mut warnings,
            Some(MessageLevel::Error) => &mut errors,
            None => continue,
        };
        if !bucket.iter().any(|seen| seen == trimmed) {
            bucket.push(trimmed.to_owned());
        }
    }

    (warnings, errors)
}

fn classify(line: &str) -> Option<MessageLevel> {
    let lower = line.to_ascii_lowercase();
    let levels = [
        ("warning", MessageLevel::Warning),
        ("error", MessageLevel::Error),
    ];

    levels.into_iter().find_map(|(word, level)| {
        let located = lower.contains(&format!(": {word} ")) || lower.contains(&format!(": {word}:"));
        let bare = lower.starts_with(&format!("{word} ")) || lower.starts_with(&format!("{word}:"));
        (located || bare).then_some(level)
    })
}
