//! The msbuild/mdtool driver: turns projects into build commands and finds what they produced.

use std::path::{Path, PathBuf};

use solship_platform::{split_config_key, Artifact, BuildPlatform, Project};

use crate::command::{BuildCommand, BuildTool};
use crate::error::DriverError;
use crate::invoke::ExecutionReport;
use crate::outputs::BuildWindow;

/// Builds Xamarin-style solutions with msbuild, or mdtool for Apple projects when forced.
#[derive(Debug, Clone)]
pub struct MsBuildDriver {
    solution: PathBuf,
    apple_tool: BuildTool,
    archives_dir: Option<PathBuf>,
}

impl MsBuildDriver {
    /// Create a driver for `solution`.
    ///
    /// When `force_mdtool` is set, Apple-platform projects are archived with
    /// mdtool; Android projects always use msbuild.
    pub fn new(solution: &Path, force_mdtool: bool) -> Self {
        Self {
            solution: solution.to_path_buf(),
            apple_tool: if force_mdtool {
                BuildTool::MdTool
            } else {
                BuildTool::MsBuild
            },
            archives_dir: crate::outputs::default_archives_dir(),
        }
    }

    /// Look for shared archives in `dir` instead of the default Xcode location.
    pub fn with_archives_dir(mut self, dir: Option<&Path>) -> Self {
        self.archives_dir = dir.map(Path::to_path_buf);
        self
    }

    pub fn solution(&self) -> &Path {
        &self.solution
    }

    /// Read the solution and its platform projects.
    ///
    /// # Errors
    /// Returns an error if the solution or a project file cannot be read or parsed.
    pub fn discover_projects(&self) -> Result<Vec<Project>, DriverError> {
        crate::solution::discover_projects(&self.solution)
    }

    /// Construct the command that builds `project` for the solution
    /// `configuration`/`platform` pair.
    ///
    /// Apple projects built with msbuild are built at solution level, so
    /// several projects of one solution can share an identical command.
    ///
    /// # Errors
    /// Returns `DriverError::ConfigurationNotMapped` if the solution maps no
    /// project configuration for the pair.
    pub fn build_command(
        &self,
        project: &Project,
        configuration: &str,
        platform: &str,
    ) -> Result<BuildCommand, DriverError> {
        let project_pair = project
            .project_configuration(configuration, platform)
            .ok_or_else(|| DriverError::ConfigurationNotMapped {
                project: project.name.clone(),
                configuration: solship_platform::config_key(configuration, platform),
            })?;
        let (project_config, project_platform) =
            split_config_key(&project_pair).unwrap_or((configuration, platform));

        let command = match (project.platform, self.apple_tool) {
            (BuildPlatform::Android, _) => {
                let mut cmd = BuildCommand::msbuild(&project.path)
                    .target("SignAndroidPackage")
                    .property("Configuration", project_config);
                if !project_platform.eq_ignore_ascii_case("AnyCPU") {
                    cmd = cmd.property("Platform", project_platform);
                }
                cmd
            }
            (_, BuildTool::MdTool) => BuildCommand::mdtool("archive", &self.solution)
                .configuration(&solship_platform::config_key(configuration, platform))
                .project(&project.name),
            (apple, BuildTool::MsBuild) => {
                let mut cmd = BuildCommand::msbuild(&self.solution)
                    .target("Build")
                    .property("Configuration", configuration)
                    .property("Platform", platform)
                    .property("ArchiveOnBuild", "true");
                if apple != BuildPlatform::MacOs && project_platform == "iPhone" {
                    cmd = cmd.property("BuildIpa", "true");
                }
                cmd
            }
        };

        Ok(command)
    }

    /// Run a build command.
    ///
    /// # Errors
    /// Returns `DriverError::Exec` if the build tool cannot be started.
    pub fn execute(&self, command: &BuildCommand) -> Result<ExecutionReport, DriverError> {
        crate::invoke::execute(command)
    }

    /// Find what `project` produced for the solution `configuration`/`platform` pair.
    ///
    /// # Errors
    /// Returns an error if an artifact pattern cannot be expanded.
    pub fn collect_artifacts(
        &self,
        project: &Project,
        configuration: &str,
        platform: &str,
        window: &BuildWindow,
    ) -> Result<Vec<Artifact>, DriverError> {
        let output_dir = self.output_dir(project, configuration, platform);
        tracing::debug!(
            project = %project.name,
            dir = %output_dir.display(),
            "looking for artifacts"
        );
        crate::outputs::find_artifacts(
            project.platform,
            &project.assembly_name,
            &output_dir,
            self.archives_dir.as_deref(),
            Some(window),
        )
    }

    /// The project's output directory, falling back to the conventional `bin/...` layout.
    fn output_dir(&self, project: &Project, configuration: &str, platform: &str) -> PathBuf {
        if let Some(dir) = project.output_dir(configuration, platform) {
            return dir.to_path_buf();
        }
        let project_dir = project
            .path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let pair = project
            .project_configuration(configuration, platform)
            .unwrap_or_else(|| solship_platform::config_key(configuration, platform));
        let (project_config, project_platform) =
            split_config_key(&pair).unwrap_or((configuration, platform));

        match project.platform {
            BuildPlatform::Android => project_dir.join("bin").join(project_config),
            _ => project_dir
                .join("bin")
                .join(project_platform)
                .join(project_config),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;
    use std::time::{Duration, SystemTime};

    use super::*;

    fn ios_project(name: &str) -> Project {
        Project::new(
            name,
            Path::new(&format!("/src/{name}/{name}.csproj")),
            BuildPlatform::Ios,
        )
    }

    #[test]
    fn apple_projects_share_solution_level_command() {
        let driver = MsBuildDriver::new(Path::new("/src/App.sln"), false);
        let app = driver
            .build_command(&ios_project("App.iOS"), "Release", "iPhone")
            .unwrap();
        let extension = driver
            .build_command(&ios_project("App.Share"), "Release", "iPhone")
            .unwrap();

        assert_eq!(app.command_line(), extension.command_line());
        assert_eq!(
            app.command_line(),
            "msbuild /src/App.sln /t:Build /p:Configuration=Release /p:Platform=iPhone /p:ArchiveOnBuild=true /p:BuildIpa=true"
        );
    }

    #[test]
    fn simulator_builds_skip_ipa() {
        let driver = MsBuildDriver::new(Path::new("/src/App.sln"), false);
        let cmd = driver
            .build_command(&ios_project("App.iOS"), "Debug", "iPhoneSimulator")
            .unwrap();
        assert!(!cmd.command_line().contains("BuildIpa"));
    }

    #[test]
    fn android_builds_project_file() {
        let driver = MsBuildDriver::new(Path::new("/src/App.sln"), true);
        let mut project = Project::new(
            "App.Droid",
            Path::new("/src/App.Droid/App.Droid.csproj"),
            BuildPlatform::Android,
        );
        project
            .configurations
            .insert("Release|iPhone".to_owned(), "Release|AnyCPU".to_owned());

        let cmd = driver.build_command(&project, "Release", "iPhone").unwrap();
        assert_eq!(
            cmd.command_line(),
            "msbuild /src/App.Droid/App.Droid.csproj /t:SignAndroidPackage /p:Configuration=Release"
        );
    }

    #[test]
    fn forced_mdtool_archives_apple_projects() {
        let driver = MsBuildDriver::new(Path::new("/src/App.sln"), true);
        let cmd = driver
            .build_command(&ios_project("App.iOS"), "Release", "iPhone")
            .unwrap();
        assert_eq!(
            cmd.command_line(),
            "mdtool archive '-c:Release|iPhone' /src/App.sln -p:App.iOS"
        );
    }

    #[test]
    fn unmapped_configuration_is_an_error() {
        let driver = MsBuildDriver::new(Path::new("/src/App.sln"), false);
        let mut project = ios_project("App.iOS");
        project
            .configurations
            .insert("Debug|iPhone".to_owned(), "Debug|iPhone".to_owned());

        let err = driver
            .build_command(&project, "Release", "iPhone")
            .unwrap_err();
        assert!(matches!(err, DriverError::ConfigurationNotMapped { .. }));
        assert!(err.to_string().contains("Release|iPhone"));
    }

    #[test]
    fn collect_uses_conventional_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let project_path = tmp.path().join("App.iOS").join("App.iOS.csproj");
        let out = tmp.path().join("App.iOS").join("bin").join("iPhone").join("Release");
        fs::create_dir_all(out.join("App.iOS.app")).unwrap();

        let driver = MsBuildDriver::new(&tmp.path().join("App.sln"), false).with_archives_dir(None);
        let project = Project::new("App.iOS", &project_path, BuildPlatform::Ios);
        let now = SystemTime::now();
        let window = BuildWindow::new(now - Duration::from_secs(5), now);

        let artifacts = driver
            .collect_artifacts(&project, "Release", "iPhone", &window)
            .unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts.first().unwrap().path, out.join("App.iOS.app"));
    }
}
