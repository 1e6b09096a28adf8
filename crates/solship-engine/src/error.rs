//! Error types for solship-engine.

/// Errors produced by engine operations. Every variant is fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The step configuration is incomplete or invalid.
    #[error("{0}")]
    Config(#[from] solship_config::ConfigError),

    /// The project type whitelist names an unknown platform.
    #[error("invalid project type whitelist: {0}")]
    Whitelist(#[from] solship_platform::PlatformError),

    /// A utility operation failed.
    #[error("{0}")]
    Util(#[from] solship_util::error::UtilError),

    /// The build-tool driver failed outside of a project build.
    #[error("{0}")]
    Driver(#[from] solship_msbuild::DriverError),

    /// A project build failed. `warnings` holds everything collected up to
    /// and including the failing build, so it can be reported first.
    #[error("build of {project} failed: {reason}")]
    BuildFailed {
        project: String,
        reason: String,
        warnings: Vec<String>,
    },

    /// The build phase succeeded but nothing was produced.
    #[error("no outputs generated — check that configuration \"{configuration}\" and platform \"{platform}\" build archives or packages")]
    NoOutput {
        configuration: String,
        platform: String,
    },

    /// Copying or archiving an artifact into the deploy directory failed.
    #[error("cannot export {path}: {source}")]
    Export {
        path: String,
        source: solship_util::error::UtilError,
    },

    /// The environment-registration sink rejected a key.
    #[error("cannot register {key}: {message}")]
    Register { key: String, message: String },
}

impl EngineError {
    /// Warnings that must be reported before this error, if any.
    pub fn warnings(&self) -> &[String] {
        match self {
            EngineError::BuildFailed { warnings, .. } => warnings,
            _ => &[],
        }
    }
}
