#![forbid(unsafe_code)]

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use solship_config::StepConfig;
use solship_engine::{EnvFileSink, EnvSink, EnvmanSink};
use solship_msbuild::MsBuildDriver;
use solship_util::archive::ZipCli;
use solship_util::fs::ConflictPolicy;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(
    name = "solship",
    about = "Build a multi-platform Xamarin solution and export its artifacts"
)]
#[command(version)]
struct Cli {
    /// Log discovery and copy details
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build every whitelisted project and export the outputs
    Build {
        /// Read step inputs from a TOML file instead of the environment
        #[arg(long)]
        config: Option<PathBuf>,
        /// Append exported paths to this file instead of calling envman
        #[arg(long)]
        env_file: Option<PathBuf>,
        /// Fail instead of replacing outputs left in the deploy directory
        #[arg(long)]
        no_clobber: bool,
        /// Where to look for shared Xcode archives (defaults to ~/Library/Developer/Xcode/Archives)
        #[arg(long)]
        archives_dir: Option<PathBuf>,
    },
    /// Print the build commands a build would run, without running them
    Plan {
        /// Read step inputs from a TOML file instead of the environment
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Build {
            config,
            env_file,
            no_clobber,
            archives_dir,
        } => cmd_build(
            config.as_deref(),
            env_file.as_deref(),
            no_clobber,
            archives_dir.as_deref(),
        ),
        Command::Plan { config } => cmd_plan(config.as_deref()),
    };

    if let Err(msg) = result {
        eprintln!("error: {msg}");
        process::exit(1);
    }
}

/// Log to stderr without timestamps; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<StepConfig, Box<dyn Error>> {
    let config = match path {
        Some(path) => StepConfig::from_path(path)?,
        None => StepConfig::from_env(),
    };
    config.log();
    Ok(config)
}

fn cmd_build(
    config: Option<&Path>,
    env_file: Option<&Path>,
    no_clobber: bool,
    archives_dir: Option<&Path>,
) -> CliResult {
    let config = load_config(config)?;

    let mut driver = MsBuildDriver::new(Path::new(&config.solution), config.use_mdtool());
    if archives_dir.is_some() {
        driver = driver.with_archives_dir(archives_dir);
    }

    let mut sink: Box<dyn EnvSink> = match env_file {
        Some(path) => Box::new(EnvFileSink::new(path)),
        None => Box::new(EnvmanSink::default()),
    };
    let policy = if no_clobber {
        ConflictPolicy::Fail
    } else {
        ConflictPolicy::Replace
    };

    let outcome = solship_engine::run(&config, &driver, &ZipCli::default(), sink.as_mut(), policy)?;

    eprintln!();
    for record in &outcome.records {
        println!("{}={}", record.key, record.path.display());
    }
    eprintln!(
        "    Exported {} artifact(s) to {}",
        outcome.records.len(),
        config.deploy_dir
    );
    Ok(())
}

fn cmd_plan(config: Option<&Path>) -> CliResult {
    let config = load_config(config)?;
    let driver = MsBuildDriver::new(Path::new(&config.solution), config.use_mdtool());

    let (planned, warnings) = solship_engine::plan(&config, &driver)?;

    for build in &planned {
        let note = if build.already_performed {
            "  (already performed)"
        } else {
            ""
        };
        println!("# {} [{}]{note}", build.project, build.platform);
        println!("{}", build.command_line);
    }
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    eprintln!(
        "    {} project(s), {} build command(s)",
        planned.len(),
        planned.iter().filter(|b| !b.already_performed).count()
    );
    Ok(())
}
