//! Environment registration: how export results reach later pipeline steps.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use solship_util::process::run_command_with_stdin;

use crate::error::EngineError;

/// Receives every (key, path) pair the exporter produces.
pub trait EnvSink {
    /// Publish `value` under `key`.
    ///
    /// # Errors
    /// Returns `EngineError::Register` if the value cannot be published.
    fn register(&mut self, key: &str, value: &str) -> Result<(), EngineError>;
}

/// Registers values with `envman add --key <KEY>`, passing the value on stdin.
#[derive(Debug, Clone)]
pub struct EnvmanSink {
    program: PathBuf,
}

impl Default for EnvmanSink {
    fn default() -> Self {
        Self {
            program: PathBuf::from("envman"),
        }
    }
}

impl EnvmanSink {
    pub fn with_program(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
        }
    }
}

impl EnvSink for EnvmanSink {
    fn register(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        let register_err = |message: String| EngineError::Register {
            key: key.to_owned(),
            message,
        };

        let output = run_command_with_stdin(
            Command::new(&self.program).args(["add", "--key", key]),
            value,
        )
        .map_err(|e| register_err(e.to_string()))?;

        if !output.success {
            return Err(register_err(output.combined_trimmed()));
        }
        Ok(())
    }
}

/// Appends `KEY=value` lines (value shell-quoted) to a file that later steps can source.
#[derive(Debug, Clone)]
pub struct EnvFileSink {
    path: PathBuf,
}

impl EnvFileSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EnvSink for EnvFileSink {
    fn register(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        let register_err = |e: std::io::Error| EngineError::Register {
            key: key.to_owned(),
            message: format!("cannot write {}: {e}", self.path.display()),
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(register_err)?;
        writeln!(file, "{key}={}", solship_util::shell::quote(value)).map_err(register_err)
    }
}

/// Records registrations in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    /// Every registration, in call order.
    pub entries: Vec<(String, String)>,
}

impl MemorySink {
    /// The latest value registered under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl EnvSink for MemorySink {
    fn register(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        self.entries.push((key.to_owned(), value.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn memory_sink_returns_latest_value() {
        let mut sink = MemorySink::default();
        sink.register("BITRISE_IPA_PATH", "/deploy/a.ipa").unwrap();
        sink.register("BITRISE_IPA_PATH", "/deploy/b.ipa").unwrap();
        assert_eq!(sink.get("BITRISE_IPA_PATH"), Some("/deploy/b.ipa"));
        assert_eq!(sink.get("BITRISE_APK_PATH"), None);
        assert_eq!(sink.entries.len(), 2);
    }

    #[test]
    fn env_file_sink_appends_quoted_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("exports.env");
        let mut sink = EnvFileSink::new(&path);

        sink.register("BITRISE_APK_PATH", "/deploy/app.apk").unwrap();
        sink.register("BITRISE_APP_PATH", "/deploy/My App.app").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "BITRISE_APK_PATH=/deploy/app.apk\nBITRISE_APP_PATH='/deploy/My App.app'\n"
        );
    }

    #[test]
    fn env_file_sink_reports_unwritable_path() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = EnvFileSink::new(&tmp.path().join("missing").join("exports.env"));
        let err = sink.register("KEY", "value").unwrap_err();
        assert!(matches!(err, EngineError::Register { .. }));
        assert!(err.to_string().contains("KEY"));
    }

    #[test]
    fn envman_sink_missing_program_is_register_error() {
        let mut sink = EnvmanSink::with_program(Path::new("nonexistent_envman_xyz"));
        let err = sink.register("BITRISE_APK_PATH", "/deploy/app.apk").unwrap_err();
        assert!(matches!(err, EngineError::Register { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn envman_sink_passes_key_and_stdin() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("calls");
        let tool = tmp.path().join("envman");
        fs::write(
            &tool,
            format!(
                "#!/bin/sh\necho \"$*\" >> '{}'\ncat >> '{}'\n",
                log.display(),
                log.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let mut sink = EnvmanSink::with_program(&tool);
        sink.register("BITRISE_IPA_PATH", "/deploy/App.ipa").unwrap();

        assert_eq!(
            fs::read_to_string(&log).unwrap(),
            "add --key BITRISE_IPA_PATH\n/deploy/App.ipa"
        );
    }
}
