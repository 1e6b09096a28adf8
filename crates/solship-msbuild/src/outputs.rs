//! Locating build artifacts in project output directories.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use solship_platform::{Artifact, ArtifactKind, BuildPlatform};

use crate::error::DriverError;

/// Timestamps on some filesystems are coarse; allow this much slack either side.
const WINDOW_SLACK: Duration = Duration::from_secs(2);

/// The interval in which a build ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildWindow {
    pub start: SystemTime,
    pub end: SystemTime,
}

impl BuildWindow {
    pub fn new(start: SystemTime, end: SystemTime) -> Self {
        Self { start, end }
    }

    /// Whether `time` falls inside the window, give or take the slack.
    pub fn contains(&self, time: SystemTime) -> bool {
        let lower = self.start.checked_sub(WINDOW_SLACK).unwrap_or(self.start);
        let upper = self.end.checked_add(WINDOW_SLACK).unwrap_or(self.end);
        time >= lower && time <= upper
    }

    fn contains_path(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .is_ok_and(|t| self.contains(t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryType {
    File,
    Dir,
}

/// Expand `pattern` relative to `dir`, keeping only entries of `entry_type`.
fn find(dir: &Path, pattern: &str, entry_type: EntryType) -> Result<Vec<PathBuf>, DriverError> {
    let escaped = glob::Pattern::escape(&dir.display().to_string());
    let full = format!("{escaped}/{pattern}");
    let paths = glob::glob(&full).map_err(|e| DriverError::Glob {
        pattern: full.clone(),
        message: e.to_string(),
    })?;

    let mut found = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| DriverError::Glob {
            pattern: full.clone(),
            message: e.to_string(),
        })?;
        let matches = match entry_type {
            EntryType::File => path.is_file(),
            EntryType::Dir => path.is_dir(),
        };
        if matches {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn artifacts_of(kind: ArtifactKind, paths: Vec<PathBuf>) -> impl Iterator<Item = Artifact> {
    paths.into_iter().map(move |path| Artifact { kind, path })
}

/// Find the artifacts a project left in `output_dir`.
///
/// Archives are also looked up in `archives_dir` (the shared Xcode archives
/// location, `<archives_dir>/<date>/<assembly>*.xcarchive`), where only those
/// modified inside `window` count; anything older belongs to an earlier run.
///
/// # Errors
/// Returns an error if an artifact pattern cannot be expanded.
pub fn find_artifacts(
    platform: BuildPlatform,
    assembly_name: &str,
    output_dir: &Path,
    archives_dir: Option<&Path>,
    window: Option<&BuildWindow>,
) -> Result<Vec<Artifact>, DriverError> {
    let mut artifacts: Vec<Artifact> = Vec::new();

    match platform {
        BuildPlatform::Android => {
            let signed = find(output_dir, "*-Signed.apk", EntryType::File)?;
            let apks = if signed.is_empty() {
                find(output_dir, "*.apk", EntryType::File)?
            } else {
                signed
            };
            artifacts.extend(artifacts_of(ArtifactKind::InstallablePackage, apks));
        }
        BuildPlatform::Ios | BuildPlatform::TvOs => {
            artifacts.extend(artifacts_of(
                ArtifactKind::PackageArchive,
                find_archives(assembly_name, output_dir, archives_dir, window)?,
            ));
            artifacts.extend(artifacts_of(
                ArtifactKind::InstallablePackage,
                find(output_dir, "**/*.ipa", EntryType::File)?,
            ));
            artifacts.extend(artifacts_of(
                ArtifactKind::DebugSymbols,
                find(output_dir, "*.dSYM", EntryType::Dir)?,
            ));
            artifacts.extend(artifacts_of(
                ArtifactKind::AppBundle,
                find(output_dir, "*.app", EntryType::Dir)?,
            ));
        }
        BuildPlatform::MacOs => {
            artifacts.extend(artifacts_of(
                ArtifactKind::PackageArchive,
                find_archives(assembly_name, output_dir, archives_dir, window)?,
            ));
            artifacts.extend(artifacts_of(
                ArtifactKind::AppBundle,
                find(output_dir, "*.app", EntryType::Dir)?,
            ));
            artifacts.extend(artifacts_of(
                ArtifactKind::InstallerPackage,
                find(output_dir, "*.pkg", EntryType::File)?,
            ));
        }
    }

    Ok(artifacts)
}

fn find_archives(
    assembly_name: &str,
    output_dir: &Path,
    archives_dir: Option<&Path>,
    window: Option<&BuildWindow>,
) -> Result<Vec<PathBuf>, DriverError> {
    let mut archives = find(output_dir, "*.xcarchive", EntryType::Dir)?;

    if let Some(shared) = archives_dir {
        let pattern = format!("*/{}*.xcarchive", glob::Pattern::escape(assembly_name));
        let recent = find(shared, &pattern, EntryType::Dir)?
            .into_iter()
            .filter(|p| window.map_or(true, |w| w.contains_path(p)));
        for archive in recent {
            if !archives.contains(&archive) {
                archives.push(archive);
            }
        }
    }

    Ok(archives)
}

/// The shared Xcode archives directory under `$HOME`, if `HOME` is set.
pub fn default_archives_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join("Library")
            .join("Developer")
            .join("Xcode")
            .join("Archives")
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    fn kinds(artifacts: &[Artifact]) -> Vec<(ArtifactKind, String)> {
        artifacts
            .iter()
            .map(|a| {
                (
                    a.kind,
                    a.path.file_name().unwrap().to_string_lossy().into_owned(),
                )
            })
            .collect()
    }

    #[test]
    fn android_prefers_signed_apk() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("com.app.apk"), b"").unwrap();
        fs::write(tmp.path().join("com.app-Signed.apk"), b"").unwrap();

        let found =
            find_artifacts(BuildPlatform::Android, "App", tmp.path(), None, None).unwrap();
        assert_eq!(
            kinds(&found),
            vec![(ArtifactKind::InstallablePackage, "com.app-Signed.apk".to_owned())]
        );
    }

    #[test]
    fn android_falls_back_to_unsigned_apk() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("com.app.apk"), b"").unwrap();

        let found =
            find_artifacts(BuildPlatform::Android, "App", tmp.path(), None, None).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn ios_finds_every_kind() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("bin").join("iPhone").join("Release");
        fs::create_dir_all(out.join("App.xcarchive")).unwrap();
        fs::create_dir_all(out.join("App.dSYM")).unwrap();
        fs::create_dir_all(out.join("App.app")).unwrap();
        fs::create_dir_all(out.join("App 2024-01-01 10-00-00")).unwrap();
        fs::write(out.join("App 2024-01-01 10-00-00").join("App.ipa"), b"").unwrap();

        let found = find_artifacts(BuildPlatform::Ios, "App", &out, None, None).unwrap();
        assert_eq!(
            kinds(&found),
            vec![
                (ArtifactKind::PackageArchive, "App.xcarchive".to_owned()),
                (ArtifactKind::InstallablePackage, "App.ipa".to_owned()),
                (ArtifactKind::DebugSymbols, "App.dSYM".to_owned()),
                (ArtifactKind::AppBundle, "App.app".to_owned()),
            ]
        );
    }

    #[test]
    fn macos_finds_pkg_but_not_dsym() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Mac.app")).unwrap();
        fs::create_dir_all(tmp.path().join("Mac.dSYM")).unwrap();
        fs::write(tmp.path().join("Mac.pkg"), b"").unwrap();

        let found = find_artifacts(BuildPlatform::MacOs, "Mac", tmp.path(), None, None).unwrap();
        assert_eq!(
            kinds(&found),
            vec![
                (ArtifactKind::AppBundle, "Mac.app".to_owned()),
                (ArtifactKind::InstallerPackage, "Mac.pkg".to_owned()),
            ]
        );
    }

    #[test]
    fn missing_output_dir_yields_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let found = find_artifacts(
            BuildPlatform::Ios,
            "App",
            &tmp.path().join("absent"),
            None,
            None,
        )
        .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn output_dir_with_glob_characters_is_escaped() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("bin [Release]");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("App.apk"), b"").unwrap();

        let found = find_artifacts(BuildPlatform::Android, "App", &out, None, None).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn shared_archives_respect_window() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let shared = tmp.path().join("Archives");
        fs::create_dir_all(shared.join("2024-01-01").join("App 1-1-24.xcarchive")).unwrap();
        fs::create_dir_all(shared.join("2024-01-01").join("Other.xcarchive")).unwrap();

        let now = SystemTime::now();
        let current = BuildWindow::new(now - Duration::from_secs(60), now + Duration::from_secs(60));
        let found =
            find_artifacts(BuildPlatform::Ios, "App", &out, Some(&shared), Some(&current)).unwrap();
        assert_eq!(
            kinds(&found),
            vec![(ArtifactKind::PackageArchive, "App 1-1-24.xcarchive".to_owned())]
        );

        let past = BuildWindow::new(
            now - Duration::from_secs(7200),
            now - Duration::from_secs(3600),
        );
        let found =
            find_artifacts(BuildPlatform::Ios, "App", &out, Some(&shared), Some(&past)).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn window_contains_with_slack() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1000);
        let end = start + Duration::from_secs(10);
        let window = BuildWindow::new(start, end);
        assert!(window.contains(start - Duration::from_secs(1)));
        assert!(window.contains(end + Duration::from_secs(1)));
        assert!(!window.contains(start - Duration::from_secs(5)));
        assert!(!window.contains(end + Duration::from_secs(5)));
    }
}
