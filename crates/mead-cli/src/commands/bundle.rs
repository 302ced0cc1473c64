use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use mead_core::read_config_file_or_json;
use mead_export::save_to_bundle;

#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Directory holding the trained model's artifacts.
    #[arg(long = "from")]
    pub directory: PathBuf,
    /// Bundle directory to copy into.
    #[arg(long = "to")]
    pub output: PathBuf,
    /// JSON or YAML written to `model.assets`.
    #[arg(long)]
    pub assets: Option<PathBuf>,
}

pub fn run(args: &BundleArgs) -> Result<(), Box<dyn Error>> {
    let assets = match &args.assets {
        Some(path) => Some(read_config_file_or_json(path.as_path(), "assets")?),
        None => None,
    };
    let copied = save_to_bundle(&args.output, &args.directory, assets.as_ref())?;
    for path in copied {
        println!("{}", path.display());
    }
    Ok(())
}
