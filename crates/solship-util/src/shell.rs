//! POSIX shell-word splitting and quoting, backed by `shell-words`.
//!
//! Custom build options arrive as one raw string per platform and must be
//! split the way a shell would split them.

use crate::error::UtilError;

/// Split `input` into words following POSIX shell rules.
///
/// Line endings are normalized first, so a CRLF-terminated value read from
/// the environment splits the same as its LF form.
///
/// # Errors
/// Returns `UtilError::ShellSplit` when a quoted section is never closed.
pub fn split(input: &str) -> Result<Vec<String>, UtilError> {
    let normalized = input.replace("\r\n", "\n");
    shell_words::split(normalized.trim_end_matches('\r')).map_err(|source| {
        UtilError::ShellSplit {
            input: input.to_owned(),
            source,
        }
    })
}

/// Quote a single word so that [`split`] returns it unchanged.
pub fn quote(word: &str) -> String {
    shell_words::quote(word).into_owned()
}

/// Join words into a single shell-quoted command line.
pub fn join<S: AsRef<str>>(words: &[S]) -> String {
    shell_words::join(words)
}
