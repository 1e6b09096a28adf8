//! Build orchestration: one invocation per project, identical invocations only once.

use std::collections::HashSet;
use std::time::SystemTime;

use solship_msbuild::{BuildCommand, BuildWindow, DriverError};
use solship_platform::Project;

use crate::driver::BuildDriver;
use crate::error::EngineError;

/// Lines of build output quoted in a failure message.
const FAILURE_TAIL_LINES: usize = 20;

/// Reported once per project that got a build invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress<'a> {
    pub project: &'a Project,
    /// The finalized command line, custom options included.
    pub command_line: &'a str,
    /// An identical command already ran earlier in this run and was not repeated.
    pub already_performed: bool,
}

/// Outcome of a successful build phase.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// Projects that were built, directly or through a shared invocation.
    pub built: Vec<Project>,
    /// Distinct command lines, in execution order.
    pub executed: Vec<String>,
    /// Warnings collected during the run, in first-seen order.
    pub warnings: Vec<String>,
    /// When the build phase started and ended.
    pub window: BuildWindow,
}

/// Sequences project builds for one solution configuration/platform pair.
#[derive(Debug)]
pub struct Orchestrator<'a, D: BuildDriver + ?Sized> {
    driver: &'a D,
    configuration: &'a str,
    platform: &'a str,
    dry_run: bool,
    warnings: Vec<String>,
}

impl<'a, D: BuildDriver + ?Sized> Orchestrator<'a, D> {
    pub fn new(driver: &'a D, configuration: &'a str, platform: &'a str) -> Self {
        Self {
            driver,
            configuration,
            platform,
            dry_run: false,
            warnings: Vec::new(),
        }
    }

    /// Compute and report every invocation without executing any.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Start from warnings collected before the build phase.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Build `projects` in order.
    ///
    /// For each project the invocation is constructed, handed to `prepare`
    /// (which may append options), finalized, and reported to `progress`.
    /// It is executed only if no identical command line ran before. Test
    /// projects and projects not mapped to the configuration pair are skipped
    /// with a warning.
    ///
    /// # Errors
    /// Returns `EngineError::BuildFailed` for the first project whose build
    /// fails; no later project is attempted. The error carries every warning
    /// collected so far.
    pub fn run<P, R>(
        mut self,
        projects: &[Project],
        mut prepare: P,
        mut progress: R,
    ) -> Result<BuildSummary, EngineError>
    where
        P: FnMut(&Project, &mut BuildCommand),
        R: FnMut(&BuildProgress<'_>),
    {
        let start = SystemTime::now();
        let mut performed: HashSet<String> = HashSet::new();
        let mut executed = Vec::new();
        let mut built = Vec::new();

        for project in projects {
            if let Some(framework) = project.test_framework {
                self.warn(format!(
                    "skipping {} ({framework} test project)",
                    project.name
                ));
                continue;
            }

            let mut command =
                match self
                    .driver
                    .build_command(project, self.configuration, self.platform)
                {
                    Ok(command) => command,
                    Err(DriverError::ConfigurationNotMapped {
                        project: name,
                        configuration,
                    }) => {
                        self.warn(format!(
                            "skipping {name}: not built in solution configuration {configuration}"
                        ));
                        continue;
                    }
                    Err(e) => return Err(self.fail(project, e.to_string())),
                };

            prepare(project, &mut command);
            let command_line = command.command_line();
            let already_performed = performed.contains(&command_line);

            progress(&BuildProgress {
                project,
                command_line: &command_line,
                already_performed,
            });
            built.push(project.clone());

            if already_performed {
                tracing::debug!(project = %project.name, "invocation already performed");
                continue;
            }

            if !self.dry_run {
                let report = match self.driver.execute(&command) {
                    Ok(report) => report,
                    Err(e) => return Err(self.fail(project, e.to_string())),
                };
                for warning in &report.warnings {
                    self.warn(warning.clone());
                }
                if !report.success {
                    let tail = report.output_tail(FAILURE_TAIL_LINES);
                    let reason = if tail.is_empty() {
                        report.summary()
                    } else {
                        format!("{}\n{tail}", report.summary())
                    };
                    return Err(self.fail(project, reason));
                }
            }

            performed.insert(command_line.clone());
            executed.push(command_line);
        }

        Ok(BuildSummary {
            built,
            executed,
            warnings: self.warnings,
            window: BuildWindow::new(start, SystemTime::now()),
        })
    }

    fn warn(&mut self, warning: String) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    fn fail(self, project: &Project, reason: String) -> EngineError {
        EngineError::BuildFailed {
            project: project.name.clone(),
            reason,
            warnings: self.warnings,
        }
    }
}
