//! Binary entry point for healthpack.
//!
//! Demo and inspection surface for the export/import pipeline: seeds an
//! in-memory store with generated records, exports it to a profile
//! file, and reads profile files back.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use healthpack::config::HealthpackConfig;
use healthpack::export::{
    ExportConfiguration, ExportService, ExportTarget, ExportType, JsonSingleDocExportTarget,
};
use healthpack::generator::DataGenerator;
use healthpack::import::{Profile, ProfileImporter, normalize_file_name, read_profiles_from_dir};
use healthpack::models::catalog;
use healthpack::observability::{self, InitOptions};
use healthpack::store::InMemoryHealthStore;
use std::path::PathBuf;
use std::process::ExitCode;

/// Healthpack - streaming export and import of health-record profiles.
#[derive(Parser)]
#[command(name = "healthpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for inspection commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON.
    Json,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Generate sample records and report what a store would hold.
    Generate {
        /// Days of history to generate.
        #[arg(long)]
        days: Option<u32>,

        /// Seed for the random source.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate sample records and export them to a profile file.
    Export {
        /// Profile name, also the default file stem.
        name: String,

        /// Destination directory (default: configured profiles dir).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing profile file.
        #[arg(long)]
        overwrite: bool,

        /// Omit per-record identifiers.
        #[arg(long)]
        no_uuids: bool,
    },

    /// Import a profile file into a fresh store and report counts.
    Import {
        /// Path to the profile file.
        file: PathBuf,
    },

    /// List profile files in the profiles directory.
    Profiles {
        /// Directory to scan (default: configured profiles dir).
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Show the metadata block of a profile file.
    Metadata {
        /// Path to the profile file.
        file: PathBuf,

        /// Output format.
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = observability::init_from_env(InitOptions {
        verbose: cli.verbose,
    }) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => HealthpackConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HealthpackConfig::load().context("loading configuration")?,
    };

    match cli.command {
        Commands::Generate { days, seed } => cmd_generate(&config, days, seed),
        Commands::Export {
            name,
            output,
            overwrite,
            no_uuids,
        } => cmd_export(&config, &name, output, overwrite, no_uuids),
        Commands::Import { file } => cmd_import(&file),
        Commands::Profiles { dir } => cmd_profiles(&config, dir),
        Commands::Metadata { file, format } => cmd_metadata(&file, format),
    }
}

fn populated_store(config: &HealthpackConfig, days: Option<u32>, seed: Option<u64>) -> (InMemoryHealthStore, usize) {
    let mut store = InMemoryHealthStore::new();
    let mut generator = DataGenerator::new(
        days.unwrap_or(config.generator_days),
        seed.unwrap_or(config.generator_seed),
    );
    let generated = generator.populate(&mut store);
    (store, generated)
}

fn cmd_generate(
    config: &HealthpackConfig,
    days: Option<u32>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let (store, generated) = populated_store(config, days, seed);
    println!("generated {generated} records");
    for sample_type in catalog() {
        let count = store.count_of_type(sample_type.name);
        if count > 0 {
            println!("  {:<50} {count}", sample_type.name);
        }
    }
    Ok(())
}

fn cmd_export(
    config: &HealthpackConfig,
    name: &str,
    output: Option<PathBuf>,
    overwrite: bool,
    no_uuids: bool,
) -> anyhow::Result<()> {
    let stem = normalize_file_name(name);
    if stem.is_empty() {
        bail!("profile name has no usable characters");
    }
    let dir = output.unwrap_or_else(|| config.profiles_dir.clone());
    let path = JsonSingleDocExportTarget::profile_path(&dir, &stem);

    let (store, _) = populated_store(config, None, None);
    let export_config =
        ExportConfiguration::new(name, ExportType::GeneratedByThisApp).with_uuids(!no_uuids);
    let mut target = JsonSingleDocExportTarget::to_file(&path, overwrite);
    let mut targets: [&mut dyn ExportTarget; 1] = [&mut target];

    let summary = ExportService::new()
        .export(&store, &export_config, &mut targets, |message| {
            eprintln!("{message}");
        })
        .with_context(|| format!("exporting to {}", path.display()))?;

    println!(
        "exported {} records to {}",
        summary.records_exported,
        path.display()
    );
    Ok(())
}

fn cmd_import(file: &std::path::Path) -> anyhow::Result<()> {
    let profile = Profile::at(file).with_context(|| format!("opening {}", file.display()))?;
    let mut store = InMemoryHealthStore::new();
    let summary = ProfileImporter::new()
        .import(&mut store, &profile)
        .with_context(|| format!("importing {}", file.display()))?;

    println!(
        "imported profile '{}': {} records",
        summary.profile_name, summary.records_imported
    );
    for sample_type in catalog() {
        let count = store.count_of_type(sample_type.name);
        if count > 0 {
            println!("  {:<50} {count}", sample_type.name);
        }
    }
    Ok(())
}

fn cmd_profiles(config: &HealthpackConfig, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(|| config.profiles_dir.clone());
    let profiles =
        read_profiles_from_dir(&dir).with_context(|| format!("scanning {}", dir.display()))?;

    if profiles.is_empty() {
        println!("no profiles in {}", dir.display());
        return Ok(());
    }
    for profile in profiles {
        println!("{:<40} {:>10} bytes", profile.file_name, profile.file_size);
    }
    Ok(())
}

fn cmd_metadata(file: &std::path::Path, format: OutputFormat) -> anyhow::Result<()> {
    let profile = Profile::at(file).with_context(|| format!("opening {}", file.display()))?;
    let metadata = profile
        .load_metadata()
        .with_context(|| format!("reading metadata of {}", file.display()))?;

    match format {
        OutputFormat::Text => {
            println!("profile name:  {}", metadata.profile_name);
            println!("created:       {}", metadata.creation_date.to_rfc3339());
            println!("version:       {}", metadata.version);
            println!("document type: {}", metadata.doc_type);
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "profileName": metadata.profile_name,
                "creationDate": metadata.creation_date.timestamp_millis(),
                "version": metadata.version,
                "type": metadata.doc_type,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}
