//! Output collection after the build phase.

use std::collections::HashSet;
use std::path::PathBuf;

use solship_msbuild::BuildWindow;
use solship_platform::{Artifact, BuildPlatform, Project};

use crate::driver::BuildDriver;
use crate::error::EngineError;

/// The artifacts one project produced. An empty list means "built, nothing produced".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOutput {
    pub project: String,
    pub platform: BuildPlatform,
    pub artifacts: Vec<Artifact>,
}

/// Ask the driver for each built project's artifacts, in build order.
///
/// An artifact already attributed to an earlier project (a shared archive
/// location matched by two projects) is kept only for the first.
///
/// # Errors
/// Returns `EngineError::NoOutput` if no project produced anything, or a
/// driver error if an output location cannot be searched.
pub fn collect_outputs<D: BuildDriver + ?Sized>(
    driver: &D,
    projects: &[Project],
    configuration: &str,
    platform: &str,
    window: &BuildWindow,
) -> Result<Vec<ProjectOutput>, EngineError> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut outputs = Vec::with_capacity(projects.len());

    for project in projects {
        let mut artifacts = driver.collect_artifacts(project, configuration, platform, window)?;
        artifacts.retain(|a| {
            let fresh = seen.insert(a.path.clone());
            if !fresh {
                tracing::debug!(
                    project = %project.name,
                    path = %a.path.display(),
                    "artifact already collected for another project"
                );
            }
            fresh
        });

        for artifact in &artifacts {
            tracing::debug!(
                project = %project.name,
                kind = %artifact.kind,
                path = %artifact.path.display(),
                "found artifact"
            );
        }

        outputs.push(ProjectOutput {
            project: project.name.clone(),
            platform: project.platform,
            artifacts,
        });
    }

    if outputs.iter().all(|o| o.artifacts.is_empty()) {
        return Err(EngineError::NoOutput {
            configuration: configuration.to_owned(),
            platform: platform.to_owned(),
        });
    }

    Ok(outputs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;
    use std::time::SystemTime;

    use solship_platform::ArtifactKind;

    use super::*;
    use crate::driver::fake::{project, FakeDriver};

    fn window() -> BuildWindow {
        let now = SystemTime::now();
        BuildWindow::new(now, now)
    }

    #[test]
    fn projects_without_output_are_kept_empty() {
        let mut driver = FakeDriver::default();
        driver.artifacts.insert(
            "App.iOS".to_owned(),
            vec![Artifact::new(
                ArtifactKind::InstallablePackage,
                Path::new("/out/App.ipa"),
            )],
        );
        let projects = vec![
            project("App.iOS", BuildPlatform::Ios),
            project("App.Watch", BuildPlatform::Ios),
        ];

        let outputs = collect_outputs(&driver, &projects, "Release", "iPhone", &window()).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs.first().unwrap().artifacts.len(), 1);
        assert_eq!(outputs.get(1).unwrap().project, "App.Watch");
        assert!(outputs.get(1).unwrap().artifacts.is_empty());
    }

    #[test]
    fn all_empty_is_no_output() {
        let driver = FakeDriver::default();
        let projects = vec![project("App.iOS", BuildPlatform::Ios)];
        let err = collect_outputs(&driver, &projects, "Release", "iPhone", &window()).unwrap_err();
        assert!(matches!(err, EngineError::NoOutput { .. }));
        assert!(err.to_string().contains("Release"));
    }

    #[test]
    fn nothing_built_is_no_output() {
        let driver = FakeDriver::default();
        let err = collect_outputs(&driver, &[], "Release", "iPhone", &window()).unwrap_err();
        assert!(matches!(err, EngineError::NoOutput { .. }));
    }

    #[test]
    fn shared_artifact_is_attributed_once() {
        let archive = Artifact::new(
            ArtifactKind::PackageArchive,
            Path::new("/archives/App.xcarchive"),
        );
        let mut driver = FakeDriver::default();
        driver.artifacts.insert("App".to_owned(), vec![archive.clone()]);
        driver.artifacts.insert("AppExt".to_owned(), vec![archive]);
        let projects = vec![
            project("App", BuildPlatform::Ios),
            project("AppExt", BuildPlatform::Ios),
        ];

        let outputs = collect_outputs(&driver, &projects, "Release", "iPhone", &window()).unwrap();
        assert_eq!(outputs.first().unwrap().artifacts.len(), 1);
        assert!(outputs.get(1).unwrap().artifacts.is_empty());
    }
}
