//! The end-to-end step: options, filter, build, collect, export.

use std::path::Path;

use solship_config::StepConfig;
use solship_platform::BuildPlatform;
use solship_util::archive::Archiver;
use solship_util::fs::ConflictPolicy;

use crate::collect::collect_outputs;
use crate::driver::BuildDriver;
use crate::error::EngineError;
use crate::export::{ExportRecord, Exporter};
use crate::filter::{filter_projects, parse_whitelist};
use crate::options::CustomOptions;
use crate::orchestrate::{BuildProgress, Orchestrator};
use crate::sink::EnvSink;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Every registered export, in export order.
    pub records: Vec<ExportRecord>,
    /// Warnings reported during the run.
    pub warnings: Vec<String>,
}

/// One invocation a build would perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBuild {
    pub project: String,
    pub platform: BuildPlatform,
    pub command_line: String,
    pub already_performed: bool,
}

/// Build the solution described by `config` and export what it produced.
///
/// Warnings are logged once the build phase ends, including when it ends in
/// a failed build.
///
/// # Errors
/// Returns the first fatal condition: invalid configuration or whitelist,
/// unreadable solution, failed build, no outputs, or a failed export.
pub fn run<D: BuildDriver + ?Sized>(
    config: &StepConfig,
    driver: &D,
    archiver: &dyn Archiver,
    sink: &mut dyn EnvSink,
    policy: ConflictPolicy,
) -> Result<RunOutcome, EngineError> {
    config.validate()?;
    let whitelist = parse_whitelist(&config.project_type_whitelist)?;
    let (options, option_warnings) = CustomOptions::from_config(config);

    tracing::info!("Building all projects in solution: {}", config.solution);
    let projects = filter_projects(driver.discover_projects()?, &whitelist);

    let summary = Orchestrator::new(driver, &config.configuration, &config.platform)
        .with_warnings(option_warnings)
        .run(
            &projects,
            |project, command| options.apply(project.platform, command),
            log_progress,
        )
        .inspect_err(|e| flush_warnings(e.warnings()))?;
    flush_warnings(&summary.warnings);

    tracing::info!("Collecting outputs...");
    let outputs = collect_outputs(
        driver,
        &summary.built,
        &config.configuration,
        &config.platform,
        &summary.window,
    )?;

    tracing::info!("Exporting generated outputs...");
    let records = Exporter::new(Path::new(&config.deploy_dir), archiver, sink)
        .with_policy(policy)
        .export_all(&outputs)?;

    Ok(RunOutcome {
        records,
        warnings: summary.warnings,
    })
}

/// Compute every invocation a run would perform without building anything.
///
/// # Errors
/// Returns an error if the build inputs or whitelist are invalid or the
/// solution cannot be read.
pub fn plan<D: BuildDriver + ?Sized>(
    config: &StepConfig,
    driver: &D,
) -> Result<(Vec<PlannedBuild>, Vec<String>), EngineError> {
    config.validate_build_inputs()?;
    let whitelist = parse_whitelist(&config.project_type_whitelist)?;
    let (options, option_warnings) = CustomOptions::from_config(config);
    let projects = filter_projects(driver.discover_projects()?, &whitelist);

    let mut planned = Vec::new();
    let summary = Orchestrator::new(driver, &config.configuration, &config.platform)
        .with_warnings(option_warnings)
        .dry_run(true)
        .run(
            &projects,
            |project, command| options.apply(project.platform, command),
            |progress| {
                planned.push(PlannedBuild {
                    project: progress.project.name.clone(),
                    platform: progress.project.platform,
                    command_line: progress.command_line.to_owned(),
                    already_performed: progress.already_performed,
                });
            },
        )?;

    Ok((planned, summary.warnings))
}

fn log_progress(progress: &BuildProgress<'_>) {
    tracing::info!("Building project: {}", progress.project.name);
    tracing::info!("$ {}", progress.command_line);
    if progress.already_performed {
        tracing::warn!("build command already performed, skipping...");
    }
}

fn flush_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    tracing::warn!("Build warnings:");
    for warning in warnings {
        tracing::warn!("{warning}");
    }
}
