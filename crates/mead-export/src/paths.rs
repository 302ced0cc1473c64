use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use mead_core::{expand_user, value_to_bool, ErrorInfo, MeadError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default base directory for exported models.
pub const DEFAULT_OUTPUT_DIR: &str = "./models";

/// Client and server directories of one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    /// Where client-side artifacts (vocabs, vectorizers, labels) go.
    pub client: PathBuf,
    /// Where the serving model goes; equal to `client` for local exports.
    pub server: PathBuf,
}

fn export_error(code: &str, err: impl ToString, path: &Path) -> MeadError {
    let info = ErrorInfo::new(code, err.to_string()).with_path(path);
    let info = match code {
        "mead.export_exists" => info.with_hint("pick another version or leave it unset"),
        _ => info,
    };
    MeadError::Export(info)
}

/// Returns the next free numeric version under `model_dir`, as a string.
///
/// Only numerically named subdirectories count; a missing directory yields `"1"`.
/// Fails with `mead.export_version` when the largest version has no successor.
pub fn find_model_version(model_dir: &Path) -> Result<String, MeadError> {
    let latest = fs::read_dir(model_dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|entry| entry.path().is_dir())
                .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
                .filter(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
                .filter_map(|name| name.parse::<u64>().ok())
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);
    latest
        .checked_add(1)
        .map(|next| next.to_string())
        .ok_or_else(|| {
            MeadError::Export(
                ErrorInfo::new("mead.export_version", "no version follows the latest export")
                    .with_path(model_dir)
                    .with_context("latest", latest.to_string()),
            )
        })
}

fn join_segments(base: &Path, segments: &[&str]) -> PathBuf {
    segments
        .iter()
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}

fn create_leaf(path: &Path) -> Result<(), MeadError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| export_error("mead.export_mkdir", err, parent))?;
    }
    fs::create_dir(path).map_err(|err| {
        let code = if err.kind() == io::ErrorKind::AlreadyExists {
            "mead.export_exists"
        } else {
            "mead.export_mkdir"
        };
        export_error(code, err, path)
    })
}

/// Builds the client and server export directories.
///
/// Layout is `output_dir/[client|server]/[project]/[name]/version`, with the
/// `client`/`server` level only present when `remote`. Without a project and
/// name a remote export reuses the basename of `output_dir` as the project.
/// When `version` is `None` the next free version under the server prefix is
/// used. The client directory is created for remote exports and the server
/// directory when `make_server` is set; an existing leaf is an error.
pub fn get_output_paths(
    output_dir: &Path,
    project: Option<&str>,
    name: Option<&str>,
    version: Option<&str>,
    remote: bool,
    make_server: bool,
) -> Result<OutputPaths, MeadError> {
    let basename = output_dir
        .file_name()
        .and_then(|base| base.to_str())
        .unwrap_or_default()
        .to_string();
    let project = match (remote, project, name) {
        (true, None, None) => basename.as_str(),
        (_, project, _) => project.unwrap_or_default(),
    };
    let name = name.unwrap_or_default();
    let (client, server) = if remote { ("client", "server") } else { ("", "") };

    let server_prefix = join_segments(output_dir, &[server, project, name]);
    let version = match version {
        Some(version) => version.to_string(),
        None => find_model_version(&server_prefix)?,
    };
    let client_path = join_segments(output_dir, &[client, project, name, version.as_str()]);
    let server_path = server_prefix.join(&version);

    if remote {
        create_leaf(&client_path)?;
    }
    if make_server {
        create_leaf(&server_path)?;
    }
    info!(
        target: "mead",
        "export paths: client={} server={}",
        client_path.display(),
        server_path.display()
    );
    Ok(OutputPaths {
        client: client_path,
        server: server_path,
    })
}

/// Export settings supplied on the command line; `None` falls back to config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOverrides {
    /// Base directory for exports.
    pub output_dir: Option<PathBuf>,
    /// Project level of the export layout.
    pub project: Option<String>,
    /// Model name level of the export layout.
    pub name: Option<String>,
    /// Explicit version directory.
    pub model_version: Option<String>,
    /// Exporter to run.
    pub exporter_type: Option<String>,
    /// Whether the served model returns label names.
    pub return_labels: Option<bool>,
    /// Whether the export is split into client and server bundles.
    pub is_remote: Option<bool>,
}

/// Resolved export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportParams {
    /// Base directory, with `~` expanded. Defaults to [`DEFAULT_OUTPUT_DIR`].
    pub output_dir: PathBuf,
    /// Project level; `None` leaves it out of the layout.
    pub project: Option<String>,
    /// Model name level; `None` leaves it out of the layout.
    pub name: Option<String>,
    /// Version directory; `None` picks the next free one.
    pub model_version: Option<String>,
    /// Exporter to run, `default` unless configured.
    pub exporter_type: String,
    /// Whether the served model returns label names. Defaults to `false`.
    pub return_labels: bool,
    /// Whether client and server bundles are split. Defaults to `true`.
    pub is_remote: bool,
}

impl ExportParams {
    /// Creates the export directories described by these parameters.
    pub fn output_paths(&self, make_server: bool) -> Result<OutputPaths, MeadError> {
        get_output_paths(
            &self.output_dir,
            self.project.as_deref(),
            self.name.as_deref(),
            self.model_version.as_deref(),
            self.is_remote,
            make_server,
        )
    }
}

fn config_string(config: &Value, key: &str) -> Option<String> {
    match config.get(key)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn config_bool(config: &Value, key: &str, default: bool) -> Result<bool, MeadError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value_to_bool(value),
    }
}

/// Merges command line overrides with the `export` block of a config.
pub fn get_export_params(
    config: &Value,
    overrides: &ExportOverrides,
) -> Result<ExportParams, MeadError> {
    let output_dir = overrides
        .output_dir
        .clone()
        .or_else(|| config_string(config, "output_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let exporter_type = overrides
        .exporter_type
        .clone()
        .or_else(|| config_string(config, "type"))
        .or_else(|| config_string(config, "exporter_type"))
        .unwrap_or_else(|| "default".to_string());
    let return_labels = match overrides.return_labels {
        Some(flag) => flag,
        None => config_bool(config, "return_labels", false)?,
    };
    let is_remote = match overrides.is_remote {
        Some(flag) => flag,
        None => config_bool(config, "is_remote", true)?,
    };
    Ok(ExportParams {
        output_dir: expand_user(&output_dir),
        project: overrides.project.clone().or_else(|| config_string(config, "project")),
        name: overrides.name.clone().or_else(|| config_string(config, "name")),
        model_version: overrides
            .model_version
            .clone()
            .or_else(|| config_string(config, "model_version")),
        exporter_type,
        return_labels,
        is_remote,
    })
}
