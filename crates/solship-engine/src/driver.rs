//! The build-tool seam the orchestrator and collector depend on.

use solship_msbuild::{BuildCommand, BuildWindow, DriverError, ExecutionReport, MsBuildDriver};
use solship_platform::{Artifact, Project};

/// Everything the engine needs from a build tool.
pub trait BuildDriver {
    /// List the buildable projects of the solution, in solution order.
    ///
    /// # Errors
    /// Returns an error if the solution cannot be read.
    fn discover_projects(&self) -> Result<Vec<Project>, DriverError>;

    /// Construct the invocation that builds `project` for the solution pair.
    ///
    /// # Errors
    /// Returns `DriverError::ConfigurationNotMapped` if the project does not
    /// take part in the pair.
    fn build_command(
        &self,
        project: &Project,
        configuration: &str,
        platform: &str,
    ) -> Result<BuildCommand, DriverError>;

    /// Run an invocation to completion.
    ///
    /// # Errors
    /// Returns an error only if the tool could not be run at all; a failed
    /// build is reported in the `ExecutionReport`.
    fn execute(&self, command: &BuildCommand) -> Result<ExecutionReport, DriverError>;

    /// Find what `project` produced during `window`.
    ///
    /// # Errors
    /// Returns an error if the output locations cannot be searched.
    fn collect_artifacts(
        &self,
        project: &Project,
        configuration: &str,
        platform: &str,
        window: &BuildWindow,
    ) -> Result<Vec<Artifact>, DriverError>;
}

impl BuildDriver for MsBuildDriver {
    fn discover_projects(&self) -> Result<Vec<Project>, DriverError> {
        MsBuildDriver::discover_projects(self)
    }

    fn build_command(
        &self,
        project: &Project,
        configuration: &str,
        platform: &str,
    ) -> Result<BuildCommand, DriverError> {
        MsBuildDriver::build_command(self, project, configuration, platform)
    }

    fn execute(&self, command: &BuildCommand) -> Result<ExecutionReport, DriverError> {
        MsBuildDriver::execute(self, command)
    }

    fn collect_artifacts(
        &self,
        project: &Project,
        configuration: &str,
        platform: &str,
        window: &BuildWindow,
    ) -> Result<Vec<Artifact>, DriverError> {
        MsBuildDriver::collect_artifacts(self, project, configuration, platform, window)
    }
}
