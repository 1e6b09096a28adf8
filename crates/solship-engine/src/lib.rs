#![forbid(unsafe_code)]
//! Build orchestration and artifact export for solship.
//!
//! The pipeline runs leaf-first: custom options are resolved, discovered
//! projects are filtered by platform, each project is built (identical
//! invocations only once), produced artifacts are collected per project and
//! finally exported into the deploy directory and registered with an
//! [`EnvSink`].

pub mod collect;
pub mod driver;
pub mod error;
pub mod export;
pub mod filter;
pub mod options;
pub mod orchestrate;
pub mod pipeline;
pub mod sink;

pub use collect::{collect_outputs, ProjectOutput};
pub use driver::BuildDriver;
pub use error::EngineError;
pub use export::{ExportRecord, ExportRule, ExportStrategy, Exporter, EXPORT_RULES};
pub use filter::{filter_projects, parse_whitelist};
pub use options::CustomOptions;
pub use orchestrate::{BuildProgress, BuildSummary, Orchestrator};
pub use pipeline::{plan, run, PlannedBuild, RunOutcome};
pub use sink::{EnvFileSink, EnvSink, EnvmanSink, MemorySink};
