#![forbid(unsafe_code)]
//! Filesystem, process, archiving, and shell-quoting helpers for solship.

pub mod archive;
pub mod error;
pub mod fs;
pub mod process;
pub mod shell;
