use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use mead_core::{read_config_file_or_json, str2bool};
use mead_export::{get_export_params, ExportOverrides};
use serde_json::{json, Map, Value};

#[derive(Args, Debug)]
pub struct ExportPathsArgs {
    /// Config holding an `export` block (or the block itself).
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub model_version: Option<String>,
    #[arg(long)]
    pub exporter_type: Option<String>,
    #[arg(long, value_parser = parse_bool)]
    pub return_labels: Option<bool>,
    /// Split the bundle into client and server directories.
    #[arg(long = "remote", value_parser = parse_bool)]
    pub is_remote: Option<bool>,
    /// Leave the server directory for the exporter to create.
    #[arg(long)]
    pub no_make_server: bool,
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    str2bool(raw).map_err(|err| err.to_string())
}

pub fn run(args: &ExportPathsArgs) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => read_config_file_or_json(path.as_path(), "export")?,
        None => Value::Object(Map::new()),
    };
    let export_block = config.get("export").cloned().unwrap_or(config);
    let overrides = ExportOverrides {
        output_dir: args.output_dir.clone(),
        project: args.project.clone(),
        name: args.name.clone(),
        model_version: args.model_version.clone(),
        exporter_type: args.exporter_type.clone(),
        return_labels: args.return_labels,
        is_remote: args.is_remote,
    };
    let params = get_export_params(&export_block, &overrides)?;
    let paths = params.output_paths(!args.no_make_server)?;
    let report = json!({ "params": params, "paths": paths });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
