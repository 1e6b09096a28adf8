//! Build command construction.

use std::fmt;
use std::path::{Path, PathBuf};

/// Which build tool runs a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildTool {
    /// `msbuild` (default).
    #[default]
    MsBuild,
    /// `mdtool`, the Visual Studio for Mac command-line builder.
    MdTool,
}

impl BuildTool {
    /// Executable name looked up on `PATH`.
    pub fn program(self) -> &'static str {
        match self {
            BuildTool::MsBuild => "msbuild",
            BuildTool::MdTool => "mdtool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Invocation {
    MsBuild {
        input: PathBuf,
        targets: Vec<String>,
        properties: Vec<(String, String)>,
    },
    MdTool {
        action: String,
        solution: PathBuf,
        configuration: Option<String>,
        project: Option<String>,
    },
}

/// A single build invocation, editable until it is executed.
///
/// The rendered command line (see [`BuildCommand::command_line`]) identifies
/// the invocation: two commands with the same command line do the same work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    program: String,
    invocation: Invocation,
    custom_options: Vec<String>,
}

impl BuildCommand {
    /// Start an `msbuild` command for a solution or project file.
    pub fn msbuild(input: &Path) -> Self {
        Self {
            program: BuildTool::MsBuild.program().to_owned(),
            invocation: Invocation::MsBuild {
                input: input.to_path_buf(),
                targets: Vec::new(),
                properties: Vec::new(),
            },
            custom_options: Vec::new(),
        }
    }

    /// Start an `mdtool <action>` command for a solution.
    pub fn mdtool(action: &str, solution: &Path) -> Self {
        Self {
            program: BuildTool::MdTool.program().to_owned(),
            invocation: Invocation::MdTool {
                action: action.to_owned(),
                solution: solution.to_path_buf(),
                configuration: None,
                project: None,
            },
            custom_options: Vec::new(),
        }
    }

    /// Override the executable (e.g. an absolute path to `msbuild`).
    pub fn program(mut self, program: &str) -> Self {
        program.clone_into(&mut self.program);
        self
    }

    /// Add an msbuild target (`/t:<name>`). Ignored for mdtool commands.
    pub fn target(mut self, name: &str) -> Self {
        if let Invocation::MsBuild { targets, .. } = &mut self.invocation {
            targets.push(name.to_owned());
        }
        self
    }

    /// Add an msbuild property (`/p:<key>=<value>`). Ignored for mdtool commands.
    pub fn property(mut self, key: &str, value: &str) -> Self {
        if let Invocation::MsBuild { properties, .. } = &mut self.invocation {
            properties.push((key.to_owned(), value.to_owned()));
        }
        self
    }

    /// Set the mdtool `Config|Platform` pair (`-c:<pair>`). Ignored for msbuild commands.
    pub fn configuration(mut self, pair: &str) -> Self {
        if let Invocation::MdTool { configuration, .. } = &mut self.invocation {
            *configuration = Some(pair.to_owned());
        }
        self
    }

    /// Restrict mdtool to one project (`-p:<name>`). Ignored for msbuild commands.
    pub fn project(mut self, name: &str) -> Self {
        if let Invocation::MdTool { project, .. } = &mut self.invocation {
            *project = Some(name.to_owned());
        }
        self
    }

    /// Append custom options after the generated arguments.
    pub fn set_custom_options(&mut self, options: &[String]) {
        self.custom_options.extend_from_slice(options);
    }

    pub fn custom_options(&self) -> &[String] {
        &self.custom_options
    }

    pub fn program_name(&self) -> &str {
        &self.program
    }

    /// The solution or project file this command builds.
    pub fn input(&self) -> &Path {
        match &self.invocation {
            Invocation::MsBuild { input, .. } => input,
            Invocation::MdTool { solution, .. } => solution,
        }
    }

    /// Directory the command runs in: the directory holding its input file.
    pub fn working_dir(&self) -> Option<&Path> {
        self.input().parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Build the argument list, custom options last.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();

        match &self.invocation {
            Invocation::MsBuild {
                input,
                targets,
                properties,
            } => {
                args.push(input.display().to_string());
                for target in targets {
                    args.push(format!("/t:{target}"));
                }
                for (key, value) in properties {
                    args.push(format!("/p:{key}={value}"));
                }
            }
            Invocation::MdTool {
                action,
                solution,
                configuration,
                project,
            } => {
                args.push(action.clone());
                if let Some(pair) = configuration {
                    args.push(format!("-c:{pair}"));
                }
                args.push(solution.display().to_string());
                if let Some(name) = project {
                    args.push(format!("-p:{name}"));
                }
            }
        }

        args.extend(self.custom_options.iter().cloned());
        args
    }

    /// The shell-quoted command line, program first.
    pub fn command_line(&self) -> String {
        let mut words = vec![self.program.clone()];
        words.extend(self.args());
        solship_util::shell::join(&words)
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}
