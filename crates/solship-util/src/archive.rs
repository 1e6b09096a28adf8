//! Directory archiving via the system `zip` utility.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::UtilError;
use crate::process::run_command;

/// Packs a directory into a zip archive.
pub trait Archiver {
    /// Archive `dir` into `dest`. Entries inside the archive are rooted at the
    /// directory's own name (`X.dSYM/...`), never at an absolute path.
    ///
    /// # Errors
    /// Returns an error if the archive cannot be produced.
    fn zip_dir(&self, dir: &Path, dest: &Path) -> Result<(), UtilError>;
}

/// Shells out to `zip -rTy`, run from the directory's parent.
#[derive(Debug, Clone)]
pub struct ZipCli {
    program: PathBuf,
}

impl Default for ZipCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("zip"),
        }
    }
}

impl ZipCli {
    /// Use a specific `zip` binary instead of the one on `PATH`.
    pub fn with_program(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
        }
    }

    /// Whether the configured `zip` binary can be executed.
    pub fn is_available(&self) -> bool {
        run_command(Command::new(&self.program).arg("-v")).is_ok_and(|o| o.success)
    }
}

impl Archiver for ZipCli {
    fn zip_dir(&self, dir: &Path, dest: &Path) -> Result<(), UtilError> {
        let Some(dir_name) = dir.file_name() else {
            return Err(UtilError::NoFileName {
                path: dir.display().to_string(),
            });
        };
        let parent = dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // zip runs from `parent`, so a relative destination would land there.
        let dest = if dest.is_absolute() {
            dest.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|source| UtilError::Io {
                    path: dest.display().to_string(),
                    source,
                })?
                .join(dest)
        };

        let output = run_command(
            Command::new(&self.program)
                .arg("-rTy")
                .arg(&dest)
                .arg(dir_name)
                .current_dir(parent),
        )?;

        if !output.success {
            return Err(UtilError::Archive {
                path: dir.display().to_string(),
                output: output.combined_trimmed(),
            });
        }
        Ok(())
    }
}
