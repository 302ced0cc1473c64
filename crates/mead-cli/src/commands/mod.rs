pub mod bundle;
pub mod dataset;
pub mod export_paths;
pub mod fingerprint;
