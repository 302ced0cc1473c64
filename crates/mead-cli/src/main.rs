use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{
    bundle::{self, BundleArgs},
    dataset::{self, DatasetArgs},
    export_paths::{self, ExportPathsArgs},
    fingerprint::{self, FingerprintArgs},
};
use mead_core::{configure_logger, get_mead_settings, ConfigSource};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "mead", about = "Config, fingerprint and export helpers for mead experiments")]
struct Cli {
    /// Logging config (JSON) installed before the command runs.
    #[arg(long, global = true)]
    logging: Option<PathBuf>,
    /// mead settings file (JSON or YAML).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the SHA-1 fingerprint of a model config.
    Fingerprint(FingerprintArgs),
    /// Resolve a dataset from a dataset index.
    Dataset(DatasetArgs),
    /// Create the client/server export directories and print them.
    ExportPaths(ExportPathsArgs),
    /// Copy vocab, vectorizer and label artifacts into a bundle.
    Bundle(BundleArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    if let Some(logging) = &cli.logging {
        configure_logger(logging.as_path())?;
    }
    let settings = get_mead_settings(cli.settings.map(ConfigSource::Path))?;
    match cli.command {
        Command::Fingerprint(args) => fingerprint::run(&args),
        Command::Dataset(args) => dataset::run(&args, &settings),
        Command::ExportPaths(args) => export_paths::run(&args),
        Command::Bundle(args) => bundle::run(&args),
    }
}
