//! Error types for solship-msbuild.

/// Errors produced by project discovery, build execution, and artifact lookup.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The build tool could not be started.
    #[error("cannot execute {program}: {source} — is it installed and on PATH?")]
    Exec {
        program: String,
        source: std::io::Error,
    },

    /// The solution file could not be read.
    #[error("cannot read solution {path}: {source}")]
    ReadSolution {
        path: String,
        source: std::io::Error,
    },

    /// The solution lists no buildable project.
    #[error("no projects found in solution {path}")]
    EmptySolution { path: String },

    /// A project file could not be read.
    #[error("cannot read project {path}: {source}")]
    ReadProject {
        path: String,
        source: std::io::Error,
    },

    /// A project file is not valid XML.
    #[error("invalid project file {path}: {message}")]
    ParseProject { path: String, message: String },

    /// The solution has no project configuration for the requested pair.
    #[error("project {project} has no configuration mapped for {configuration}")]
    ConfigurationNotMapped {
        project: String,
        configuration: String,
    },

    /// A glob pattern built from an output directory was invalid.
    #[error("invalid artifact pattern `{pattern}`: {message}")]
    Glob { pattern: String, message: String },

    /// An error propagated from solship-util.
    #[error("{0}")]
    Util(#[from] solship_util::error::UtilError),
}
