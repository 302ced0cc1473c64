//! Export directory layout and bundle assembly for trained mead models.

#![deny(missing_docs)]

mod bundle;
mod paths;

pub use bundle::{
    create_feature_exporter_field_map, create_metadata, save_to_bundle, ExportInfo,
    ExportMetadata, FeatureDescriptor, ASSET_FILE, BUNDLE_PATTERNS, DEFAULT_EXPORTER_FIELD,
};
pub use paths::{
    find_model_version, get_export_params, get_output_paths, ExportOverrides, ExportParams,
    OutputPaths, DEFAULT_OUTPUT_DIR,
};
