use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, info};
use mead_core::{write_json, ErrorInfo, MeadError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use walkdir::WalkDir;

/// File name of the asset manifest written next to the bundle artifacts.
pub const ASSET_FILE: &str = "model.assets";

/// Exporter field used by features that do not declare one.
pub const DEFAULT_EXPORTER_FIELD: &str = "tokens";

/// Artifacts that belong in a bundle: vocabularies, vectorizers and label maps.
pub const BUNDLE_PATTERNS: [&str; 3] = ["vocabs*", "vectorizers*", "*.labels"];

fn bundle_error(code: &str, message: impl std::fmt::Display) -> MeadError {
    MeadError::Export(ErrorInfo::new(code, message.to_string()))
}

fn bundle_globset() -> Result<GlobSet, MeadError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in BUNDLE_PATTERNS {
        builder.add(Glob::new(pattern).map_err(|err| bundle_error("mead.bundle_glob", err))?);
    }
    builder
        .build()
        .map_err(|err| bundle_error("mead.bundle_glob", err))
}

/// Empty containers, `""`, `0`, `false` and `null` carry no assets.
fn has_assets(assets: &Value) -> bool {
    match assets {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |value| value != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Array(values) => !values.is_empty(),
    }
}

/// Copies bundle artifacts from `directory` into `output_path`.
///
/// Only files directly inside `directory` are considered; symlinks are
/// followed and their targets copied. When `assets` holds
/// anything it is written to [`ASSET_FILE`]. Returns the copied destinations.
pub fn save_to_bundle(
    output_path: &Path,
    directory: &Path,
    assets: Option<&Value>,
) -> Result<Vec<PathBuf>, MeadError> {
    let patterns = bundle_globset()?;
    let mut copied = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| {
            MeadError::Export(
                ErrorInfo::new("mead.bundle_read", err.to_string()).with_path(directory),
            )
        })?;
        if !entry.file_type().is_file() || !patterns.is_match(entry.file_name()) {
            continue;
        }
        let target = output_path.join(entry.file_name());
        fs::copy(entry.path(), &target).map_err(|err| {
            MeadError::Export(
                ErrorInfo::new("mead.bundle_copy", err.to_string())
                    .with_path(entry.path())
                    .with_context("target", target.display().to_string()),
            )
        })?;
        debug!(target: "mead", "bundled {}", target.display());
        copied.push(target);
    }

    if let Some(assets) = assets.filter(|assets| has_assets(assets)) {
        write_json(assets, &output_path.join(ASSET_FILE))?;
    }
    info!(
        target: "mead",
        "saved {} artifacts to bundle {}",
        copied.len(),
        output_path.display()
    );
    Ok(copied)
}

/// Provenance block of an [`ExportMetadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportInfo {
    /// Name of the exported model.
    pub exported_model: String,
    /// UTC export time, `%Y-%m-%d %H:%M:%S%.6f`.
    pub exported_time: String,
    /// Whether the served model returns label names.
    pub return_labels: bool,
    /// Where preprocessing runs, `client` or `server`.
    pub preproc: String,
}

/// Manifest describing the serving signature of an exported model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Input tensor names of the serving signature.
    pub inputs: Vec<String>,
    /// Output tensor names of the serving signature.
    pub outputs: Vec<String>,
    /// Name of the serving signature.
    pub signature_name: String,
    /// Provenance of the export.
    pub metadata: ExportInfo,
    /// Input holding sequence lengths, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lengths_key: Option<String>,
    /// Beam width of decoding models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beam: Option<u32>,
}

impl ExportMetadata {
    /// Records the key holding sequence lengths; empty keys are ignored.
    pub fn with_lengths_key(mut self, lengths_key: impl Into<String>) -> Self {
        let lengths_key = lengths_key.into();
        if !lengths_key.is_empty() {
            self.lengths_key = Some(lengths_key);
        }
        self
    }

    /// Records the beam width; a zero width is ignored.
    pub fn with_beam(mut self, beam: u32) -> Self {
        if beam > 0 {
            self.beam = Some(beam);
        }
        self
    }

    /// Sets whether the served model returns label names.
    pub fn with_return_labels(mut self, return_labels: bool) -> Self {
        self.metadata.return_labels = return_labels;
        self
    }

    /// Sets where preprocessing runs.
    pub fn with_preproc(mut self, preproc: impl Into<String>) -> Self {
        self.metadata.preproc = preproc.into();
        self
    }

    /// Serializes the manifest to a JSON value.
    pub fn to_value(&self) -> Result<Value, MeadError> {
        serde_json::to_value(self).map_err(|err| bundle_error("mead.metadata_encode", err))
    }
}

/// Builds the export manifest, stamped with the current UTC time.
///
/// Labels are not returned and preprocessing happens on the client unless the
/// `with_*` builders say otherwise.
pub fn create_metadata<I, O>(
    inputs: I,
    outputs: O,
    signature_name: impl Into<String>,
    model_name: impl std::fmt::Display,
) -> ExportMetadata
where
    I: IntoIterator,
    I::Item: Into<String>,
    O: IntoIterator,
    O::Item: Into<String>,
{
    ExportMetadata {
        inputs: inputs.into_iter().map(Into::into).collect(),
        outputs: outputs.into_iter().map(Into::into).collect(),
        signature_name: signature_name.into(),
        metadata: ExportInfo {
            exported_model: model_name.to_string(),
            exported_time: Utc::now()
                .naive_utc()
                .format("%Y-%m-%d %H:%M:%S%.6f")
                .to_string(),
            return_labels: false,
            preproc: "client".to_string(),
        },
        lengths_key: None,
        beam: None,
    }
}

/// Feature entry of a model config; only the fields the exporter needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    /// Feature name.
    pub name: String,
    /// Serving field, falling back to the exporter default.
    #[serde(default)]
    pub exporter_field: Option<String>,
}

/// Maps each feature name to the serving field it is exported under.
pub fn create_feature_exporter_field_map(
    features: &[Value],
    default_exporter_field: &str,
) -> Result<BTreeMap<String, String>, MeadError> {
    let mut fields = BTreeMap::new();
    for (idx, feature) in features.iter().enumerate() {
        let descriptor: FeatureDescriptor =
            serde_json::from_value(feature.clone()).map_err(|err| {
                MeadError::Export(
                    ErrorInfo::new("mead.feature_descriptor", err.to_string())
                        .with_context("index", idx.to_string()),
                )
            })?;
        let field = descriptor
            .exporter_field
            .unwrap_or_else(|| default_exporter_field.to_string());
        fields.insert(descriptor.name, field);
    }
    Ok(fields)
}
