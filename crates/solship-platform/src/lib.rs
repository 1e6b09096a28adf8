#![forbid(unsafe_code)]
//! Target platforms, artifact kinds, and the project/artifact model shared by solship crates.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A target SDK family a solution project builds for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildPlatform {
    Android,
    Ios,
    TvOs,
    MacOs,
}

impl BuildPlatform {
    /// Every supported platform, in canonical order.
    pub const ALL: [BuildPlatform; 4] = [
        BuildPlatform::Android,
        BuildPlatform::Ios,
        BuildPlatform::TvOs,
        BuildPlatform::MacOs,
    ];

    /// The canonical display name (e.g. `"iOS"`).
    pub fn as_str(self) -> &'static str {
        match self {
            BuildPlatform::Android => "Android",
            BuildPlatform::Ios => "iOS",
            BuildPlatform::TvOs => "tvOS",
            BuildPlatform::MacOs => "macOS",
        }
    }

    /// Whether the platform is built by the Apple toolchain.
    pub fn is_apple(self) -> bool {
        !matches!(self, BuildPlatform::Android)
    }
}

impl fmt::Display for BuildPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildPlatform {
    type Err = PlatformError;

    /// Parse a platform name, ignoring ASCII case (`"ios"`, `"iOS"`, `"IOS"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildPlatform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PlatformError::UnknownPlatform {
                name: s.to_owned(),
                known: BuildPlatform::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Category of a produced build output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    /// An archive bundle (`.xcarchive`).
    PackageArchive,
    /// A distributable package (`.apk`, `.ipa`).
    InstallablePackage,
    /// Debug symbols (`.dSYM`).
    DebugSymbols,
    /// An application bundle (`.app`).
    AppBundle,
    /// An installer (`.pkg`).
    InstallerPackage,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::PackageArchive => "package-archive",
            ArtifactKind::InstallablePackage => "installable-package",
            ArtifactKind::DebugSymbols => "debug-symbols",
            ArtifactKind::AppBundle => "app-bundle",
            ArtifactKind::InstallerPackage => "installer-package",
        })
    }
}

/// Test framework a project references. Test projects are never built for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestFramework {
    NUnit,
    NUnitLite,
    XamarinUiTest,
}

impl fmt::Display for TestFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TestFramework::NUnit => "NUnit",
            TestFramework::NUnitLite => "NUnitLite",
            TestFramework::XamarinUiTest => "Xamarin.UITest",
        })
    }
}

/// A buildable project discovered in a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Project name as listed in the solution.
    pub name: String,
    /// Absolute path to the project file.
    pub path: PathBuf,
    pub platform: BuildPlatform,
    pub test_framework: Option<TestFramework>,
    /// Assembly name; artifact files are usually named after it.
    pub assembly_name: String,
    /// Solution `Config|Platform` -> project `Config|Platform`.
    pub configurations: BTreeMap<String, String>,
    /// Project `Config|Platform` -> output directory (absolute).
    pub output_dirs: BTreeMap<String, PathBuf>,
}

impl Project {
    /// Create a project with no configuration mappings or output directories.
    pub fn new(name: &str, path: &Path, platform: BuildPlatform) -> Self {
        Self {
            name: name.to_owned(),
            path: path.to_path_buf(),
            platform,
            test_framework: None,
            assembly_name: name.to_owned(),
            configurations: BTreeMap::new(),
            output_dirs: BTreeMap::new(),
        }
    }

    pub fn is_test_project(&self) -> bool {
        self.test_framework.is_some()
    }

    /// Resolve the project-level `Config|Platform` for a solution configuration/platform pair.
    ///
    /// A project without any recorded mappings builds with the solution pair unchanged.
    pub fn project_configuration(&self, configuration: &str, platform: &str) -> Option<String> {
        let key = config_key(configuration, platform);
        if self.configurations.is_empty() {
            return Some(key);
        }
        self.configurations.get(&key).cloned()
    }

    /// Output directory for a solution configuration/platform pair, if known.
    pub fn output_dir(&self, configuration: &str, platform: &str) -> Option<&Path> {
        let project_config = self.project_configuration(configuration, platform)?;
        self.output_dirs.get(&project_config).map(PathBuf::as_path)
    }
}

/// Join a configuration and a platform into the `Config|Platform` form used by solution files.
pub fn config_key(configuration: &str, platform: &str) -> String {
    format!("{configuration}|{platform}")
}

/// Split a `Config|Platform` pair. Returns `None` when there is no `|`.
pub fn split_config_key(key: &str) -> Option<(&str, &str)> {
    key.split_once('|')
}

/// One output produced by building a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, path: &Path) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("unknown platform \"{name}\" — expected one of: {known}")]
    UnknownPlatform { name: String, known: String },
}
