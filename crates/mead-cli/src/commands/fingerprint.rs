use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use mead_core::{
    apply_extra_args, hash_config, parse_extra_args, read_config_file_or_json, ExclusionKeys,
};

#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// Model config (JSON or YAML).
    #[arg(long)]
    pub config: PathBuf,
    /// Config sections accepting `--{base}:{key} value` overrides.
    #[arg(long = "override-base", value_name = "BASE")]
    pub override_bases: Vec<String>,
    /// Dotted keys to exclude instead of the default set.
    #[arg(long = "exclude", value_name = "KEY")]
    pub exclude: Vec<String>,
    /// Overrides, given after `--`.
    #[arg(last = true)]
    pub extra: Vec<String>,
}

pub fn run(args: &FingerprintArgs) -> Result<(), Box<dyn Error>> {
    let mut config = read_config_file_or_json(args.config.as_path(), "model")?;
    let overrides = parse_extra_args(&args.override_bases, &args.extra)?;
    apply_extra_args(&mut config, &overrides);
    let keys = if args.exclude.is_empty() {
        ExclusionKeys::default()
    } else {
        ExclusionKeys::from_dotted(args.exclude.iter().map(String::as_str))
    };
    let fingerprint = hash_config(&config, &keys)?;
    log::info!(target: "mead", "config {} hashed to {fingerprint}", args.config.display());
    println!("{fingerprint}");
    Ok(())
}
