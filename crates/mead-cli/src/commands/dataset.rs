use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use mead_core::{
    get_dataset_from_key, index_by_label, print_dataset_info, read_config_file_or_json,
    ConfigSource,
};
use serde_json::Value;

#[derive(Args, Debug)]
pub struct DatasetArgs {
    /// Dataset index: a list of labelled datasets or a mapping keyed by label.
    /// Defaults to the `datasets` entry of the mead settings.
    #[arg(long)]
    pub index: Option<PathBuf>,
    /// Dataset label, or a prefix of date-stamped labels.
    #[arg(long)]
    pub key: String,
}

pub fn run(args: &DatasetArgs, settings: &Value) -> Result<(), Box<dyn Error>> {
    let source = match (&args.index, settings.get("datasets")) {
        (Some(path), _) => ConfigSource::Path(path.clone()),
        (None, Some(datasets)) => ConfigSource::from(datasets.clone()),
        (None, None) => return Err("--index is required when settings have no `datasets`".into()),
    };
    let index = match read_config_file_or_json(source, "datasets")? {
        Value::Array(entries) => index_by_label(&entries)?,
        Value::Object(map) => map,
        _ => return Err("dataset index must be a list or a mapping".into()),
    };
    let dataset = get_dataset_from_key(&args.key, &index)?;
    print_dataset_info(dataset)?;
    println!("{}", serde_json::to_string_pretty(dataset)?);
    Ok(())
}
