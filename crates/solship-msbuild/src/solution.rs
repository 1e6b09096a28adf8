//! Solution (`.sln`) and project-file discovery.
//!
//! Only what the build needs is extracted: project names and paths, the
//! solution-to-project configuration mapping, each project's platform,
//! test framework, assembly name, and per-configuration output directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use solship_platform::{BuildPlatform, Project, TestFramework};

use crate::error::DriverError;

const SOLUTION_FOLDER_GUID: &str = "{2150E333-8FDC-42A3-9474-1A3956D46DE8}";

/// Legacy project-type GUIDs that identify a target platform.
const PLATFORM_TYPE_GUIDS: &[(&str, BuildPlatform)] = &[
    ("{EFBA0AD7-5A72-4C68-AF49-83D382785DCF}", BuildPlatform::Android),
    ("{FEACFBD2-3405-455C-9665-78FE426C6842}", BuildPlatform::Ios),
    ("{6BC8ED88-2882-458C-8E55-DFD12B67127B}", BuildPlatform::Ios),
    ("{06FA79CB-D6CD-4721-BB4B-1BD202089C55}", BuildPlatform::TvOs),
    ("{A3F8F2AB-B479-4A4A-A458-A89E7DC349F1}", BuildPlatform::MacOs),
    ("{42C0BBD9-55CE-4FC1-8D90-A7348ABAFB23}", BuildPlatform::MacOs),
];

/// Target framework suffixes of SDK-style projects (`net8.0-ios`).
const FRAMEWORK_SUFFIXES: &[(&str, BuildPlatform)] = &[
    ("android", BuildPlatform::Android),
    ("ios", BuildPlatform::Ios),
    ("tvos", BuildPlatform::TvOs),
    ("macos", BuildPlatform::MacOs),
];

const TEST_REFERENCES: &[(&str, TestFramework)] = &[
    ("nunit.framework", TestFramework::NUnit),
    ("nunit", TestFramework::NUnit),
    ("nunitlite", TestFramework::NUnitLite),
    ("xamarin.uitest", TestFramework::XamarinUiTest),
];

/// A project entry as listed in a solution file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionEntry {
    pub name: String,
    /// Path to the project file, resolved against the solution directory.
    pub path: PathBuf,
    /// Project GUID, upper-cased with braces.
    pub guid: String,
    /// Solution `Config|Platform` -> project `Config|Platform`.
    pub configurations: BTreeMap<String, String>,
}

/// Parse the text of a solution file. Solution folders are skipped.
pub fn parse_solution(content: &str, solution_dir: &Path) -> Vec<SolutionEntry> {
    let mut entries: Vec<SolutionEntry> = Vec::new();
    let mut in_config_section = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("Project(") {
            if let Some(entry) = parse_project_line(trimmed, solution_dir) {
                entries.push(entry);
            }
        } else if trimmed.starts_with("GlobalSection(ProjectConfigurationPlatforms)") {
            in_config_section = true;
        } else if trimmed.starts_with("EndGlobalSection") {
            in_config_section = false;
        } else if in_config_section {
            if let Some((guid, solution_pair, project_pair)) = parse_config_line(trimmed) {
                if let Some(entry) = entries.iter_mut().find(|e| e.guid == guid) {
                    entry.configurations.insert(solution_pair, project_pair);
                }
            }
        }
    }

    entries
}

/// `Project("{TYPE}") = "Name", "Dir\Name.csproj", "{GUID}"`
fn parse_project_line(line: &str, solution_dir: &Path) -> Option<SolutionEntry> {
    let parts: Vec<&str> = line.split('"').collect();
    let type_guid = parts.get(1)?;
    let name = parts.get(3)?;
    let rel_path = parts.get(5)?;
    let guid = parts.get(7)?;

    if type_guid.eq_ignore_ascii_case(SOLUTION_FOLDER_GUID) {
        return None;
    }

    Some(SolutionEntry {
        name: (*name).to_owned(),
        path: solution_dir.join(normalize_separators(rel_path)),
        guid: guid.to_ascii_uppercase(),
        configurations: BTreeMap::new(),
    })
}

/// `{GUID}.Release|iPhone.ActiveCfg = Release|iPhone`
///
/// Project pairs lose their spaces (`Any CPU` -> `AnyCPU`) to match project-file conditions.
fn parse_config_line(line: &str) -> Option<(String, String, String)> {
    let (left, right) = line.split_once('=')?;
    let left = left.trim().strip_suffix(".ActiveCfg")?;
    let (guid, solution_pair) = left.split_once('.')?;
    Some((
        guid.to_ascii_uppercase(),
        solution_pair.to_owned(),
        right.trim().replace(' ', ""),
    ))
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// What discovery needs from a project file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFile {
    pub type_guids: Vec<String>,
    pub target_frameworks: Vec<String>,
    pub assembly_name: Option<String>,
    /// Project `Config|Platform` -> `OutputPath` as written (separators normalized).
    pub output_paths: BTreeMap<String, String>,
    /// Unconditional `OutputPath`, if any.
    pub default_output_path: Option<String>,
    /// Assembly and package references (name only, before any `,`).
    pub references: Vec<String>,
}

impl ProjectFile {
    /// Parse project-file XML.
    ///
    /// # Errors
    /// Returns `DriverError::ParseProject` if the XML is malformed.
    pub fn parse(content: &str, path: &Path) -> Result<Self, DriverError> {
        let doc = roxmltree::Document::parse(content).map_err(|e| DriverError::ParseProject {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut project = ProjectFile::default();

        for node in doc.descendants().filter(roxmltree::Node::is_element) {
            let text = node.text().map(str::trim).unwrap_or_default();
            match node.tag_name().name() {
                "ProjectTypeGuids" => {
                    project.type_guids.extend(
                        text.split(';')
                            .map(str::trim)
                            .filter(|g| !g.is_empty())
                            .map(str::to_ascii_uppercase),
                    );
                }
                "TargetFramework" | "TargetFrameworks" => {
                    project.target_frameworks.extend(
                        text.split(';')
                            .map(str::trim)
                            .filter(|f| !f.is_empty())
                            .map(str::to_owned),
                    );
                }
                "AssemblyName" if !text.is_empty() => {
                    project.assembly_name = Some(text.to_owned());
                }
                "OutputPath" if !text.is_empty() => {
                    let condition = node
                        .parent_element()
                        .and_then(|group| group.attribute("Condition"));
                    match condition.and_then(condition_pair) {
                        Some(pair) => {
                            project
                                .output_paths
                                .insert(pair, normalize_separators(text));
                        }
                        None if condition.is_none() => {
                            project.default_output_path = Some(normalize_separators(text));
                        }
                        None => {}
                    }
                }
                "Reference" | "PackageReference" => {
                    if let Some(include) = node.attribute("Include") {
                        let name = include.split(',').next().unwrap_or(include).trim();
                        project.references.push(name.to_owned());
                    }
                }
                _ => {}
            }
        }

        Ok(project)
    }

    /// The platform this project builds for, if it is a platform project.
    pub fn platform(&self) -> Option<BuildPlatform> {
        let by_guid = self.type_guids.iter().find_map(|guid| {
            PLATFORM_TYPE_GUIDS
                .iter()
                .find(|(known, _)| known == guid)
                .map(|(_, platform)| *platform)
        });
        by_guid.or_else(|| {
            self.target_frameworks.iter().find_map(|framework| {
                let (_, suffix) = framework.split_once('-')?;
                let suffix = suffix.to_ascii_lowercase();
                FRAMEWORK_SUFFIXES
                    .iter()
                    .find(|(prefix, _)| suffix.starts_with(prefix))
                    .map(|(_, platform)| *platform)
            })
        })
    }

    /// The test framework referenced by this project, if any.
    pub fn test_framework(&self) -> Option<TestFramework> {
        self.references.iter().find_map(|reference| {
            TEST_REFERENCES
                .iter()
                .find(|(name, _)| reference.eq_ignore_ascii_case(name))
                .map(|(_, framework)| *framework)
        })
    }
}

/// Extract `Release|iPhone` from `'$(Configuration)|$(Platform)' == 'Release|iPhone'`.
fn condition_pair(condition: &str) -> Option<String> {
    let (left, right) = condition.split_once("==")?;
    if !left.contains("$(Configuration)") || !left.contains("$(Platform)") {
        return None;
    }
    let value = right.trim().trim_matches('\'').trim();
    value.contains('|').then(|| value.replace(' ', ""))
}

/// Read a solution and every platform project it lists.
///
/// Projects that do not target a supported platform (shared libraries,
/// plain .NET projects) are left out.
///
/// # Errors
/// Returns an error if the solution or a listed project file cannot be read or parsed.
pub fn discover_projects(solution: &Path) -> Result<Vec<Project>, DriverError> {
    let content = std::fs::read_to_string(solution).map_err(|source| DriverError::ReadSolution {
        path: solution.display().to_string(),
        source,
    })?;
    let solution_dir = solution.parent().unwrap_or_else(|| Path::new("."));

    let mut projects = Vec::new();
    for entry in parse_solution(&content, solution_dir) {
        let project_content =
            std::fs::read_to_string(&entry.path).map_err(|source| DriverError::ReadProject {
                path: entry.path.display().to_string(),
                source,
            })?;
        let file = ProjectFile::parse(&project_content, &entry.path)?;

        let Some(platform) = file.platform() else {
            tracing::debug!(project = %entry.name, "not a platform project, ignoring");
            continue;
        };

        let project_dir = entry.path.parent().unwrap_or(solution_dir).to_path_buf();
        let mut project = Project::new(&entry.name, &entry.path, platform);
        project.test_framework = file.test_framework();
        project.assembly_name = file.assembly_name.clone().unwrap_or_else(|| entry.name.clone());
        project.output_dirs = file
            .output_paths
            .iter()
            .map(|(pair, out)| (pair.clone(), project_dir.join(out)))
            .collect();
        if let Some(default_out) = &file.default_output_path {
            for project_pair in entry.configurations.values() {
                project
                    .output_dirs
                    .entry(project_pair.clone())
                    .or_insert_with(|| project_dir.join(default_out));
            }
        }
        project.configurations = entry.configurations;

        tracing::debug!(
            project = %project.name,
            platform = %project.platform,
            "discovered project"
        );
        projects.push(project);
    }

    if projects.is_empty() {
        return Err(DriverError::EmptySolution {
            path: solution.display().to_string(),
        });
    }

    Ok(projects)
}
