//! Error types for solship-util.

/// Errors produced by utility functions.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// An I/O operation failed.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A command failed to execute.
    #[error("cannot execute `{program}`: {source}")]
    CommandExec {
        program: String,
        source: std::io::Error,
    },

    /// A string could not be split into shell words.
    #[error("cannot split \"{input}\" into shell words: {source}")]
    ShellSplit {
        input: String,
        source: shell_words::ParseError,
    },

    /// The destination already exists and the conflict policy forbids replacing it.
    #[error("{path} already exists — remove it or allow replacing existing deploy outputs")]
    DestinationExists { path: String },

    /// A path has no final component to name a copy after.
    #[error("{path} has no file name")]
    NoFileName { path: String },

    /// The archiving utility exited unsuccessfully.
    #[error("cannot zip {path}: {output}")]
    Archive { path: String, output: String },
}
