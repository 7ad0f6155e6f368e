//! # cfglint
//!
//! Command-line host for the config schema compliance checker.
//!
//! Finds config files, checks each one against the schema registry described
//! by a manifest, and prints the diagnostics.

mod scan;

use anyhow::{Context, bail};
use cfglint_checker::{
    CheckReport, ConfigComplianceChecker, DiagnosticReporter, FileReport, QualifierVersionResolver,
    ReportFormat, VersionResolver,
};
use cfglint_ir::ConfigDocument;
use cfglint_schema::{RegistryManifest, SchemaCatalog, SchemaRegistry};
use clap::{Parser, Subcommand, ValueEnum};
use scan::HostFilter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cfglint")]
#[command(about = "Check config files against version-selected XML schemas")]
#[command(version)]
struct Cli {
    /// Schema registry manifest (YAML or JSON)
    #[arg(
        short,
        long,
        global = true,
        env = "CFGLINT_MANIFEST",
        default_value = "cfglint.yaml"
    )]
    manifest: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check config files or directories of config files
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Number of files checked in parallel
        #[arg(short, long, default_value_t = default_jobs())]
        jobs: usize,
    },

    /// List the registered schemas
    Schemas,

    /// Print the platform version a config file targets
    Resolve {
        /// Config file path
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => ReportFormat::Text,
            Format::Json => ReportFormat::Json,
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("CFGLINT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Check {
            paths,
            format,
            jobs,
        } => check(&cli.manifest, &paths, format.into(), jobs).await,
        Commands::Schemas => schemas(&cli.manifest),
        Commands::Resolve { path } => resolve(&path),
    }
}

fn load_registry(manifest_path: &Path) -> anyhow::Result<(RegistryManifest, SchemaRegistry)> {
    let manifest = RegistryManifest::load(manifest_path)
        .with_context(|| format!("failed to load manifest {}", manifest_path.display()))?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    let registry = manifest
        .build_registry(base_dir)
        .with_context(|| format!("invalid schema registry in {}", manifest_path.display()))?;
    Ok((manifest, registry))
}

async fn check(
    manifest_path: &Path,
    paths: &[PathBuf],
    format: ReportFormat,
    jobs: usize,
) -> anyhow::Result<ExitCode> {
    let (manifest, registry) = load_registry(manifest_path)?;
    let filter = HostFilter::from_manifest(&manifest);

    let files = scan::discover(paths, &filter).context("failed to scan input paths")?;
    if files.is_empty() {
        bail!(
            "no {} files found in '{}' folders",
            filter.file_name,
            filter.folder_type
        );
    }

    let jobs = jobs.max(1);
    info!("Checking {} file(s) with {} job(s)", files.len(), jobs);

    let checker = Arc::new(ConfigComplianceChecker::new(Arc::new(registry)));
    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let checker = Arc::clone(&checker);
        handles.push(tokio::task::spawn_blocking(move || {
            let diagnostics = checker.check(&ConfigDocument::on_disk(&path));
            drop(permit);
            FileReport { path, diagnostics }
        }));
    }

    // Joined in input order, so output does not depend on scheduling
    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await.context("check task failed")?);
    }

    let report = CheckReport::new(reports);
    DiagnosticReporter::new(format).write(&report, &mut std::io::stdout().lock())?;

    Ok(if report.has_diagnostics() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn schemas(manifest_path: &Path) -> anyhow::Result<ExitCode> {
    let (_, registry) = load_registry(manifest_path)?;

    println!("Minimum supported version: {}", registry.min_supported_version());
    println!("Maximum registered version: {}", registry.max_registered_version());
    for entry in registry.entries() {
        let status = if entry.source.is_available() { "" } else { " (missing)" };
        println!("  {}: {}{}", entry.version, entry.source, status);
    }
    Ok(ExitCode::SUCCESS)
}

fn resolve(path: &Path) -> anyhow::Result<ExitCode> {
    let version = QualifierVersionResolver
        .resolve(path)
        .with_context(|| format!("cannot resolve platform version of {}", path.display()))?;
    println!("{version}");
    Ok(ExitCode::SUCCESS)
}
