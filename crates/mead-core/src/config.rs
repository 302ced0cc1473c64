//! Config resolution: inline JSON values or JSON/YAML files on disk.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::errors::{ErrorInfo, MeadError};

/// Where a configuration document comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// An already parsed document.
    Inline(Value),
    /// A file to read, `~` is expanded before reading.
    Path(PathBuf),
}

impl From<Value> for ConfigSource {
    fn from(value: Value) -> Self {
        match value {
            Value::String(path) => ConfigSource::Path(PathBuf::from(path)),
            other => ConfigSource::Inline(other),
        }
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        ConfigSource::Path(path)
    }
}

impl From<&Path> for ConfigSource {
    fn from(path: &Path) -> Self {
        ConfigSource::Path(path.to_path_buf())
    }
}

impl From<&str> for ConfigSource {
    fn from(path: &str) -> Self {
        ConfigSource::Path(PathBuf::from(path))
    }
}

fn config_error(code: &str, message: impl std::fmt::Display, path: &Path) -> MeadError {
    MeadError::Config(ErrorInfo::new(code, message.to_string()).with_path(path))
}

/// Expands a leading `~` to the current user's home directory.
pub fn expand_user(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Reads a YAML (`.yml`/`.yaml`) or JSON config file into a JSON value.
pub fn read_config_file(path: &Path) -> Result<Value, MeadError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        config_error("mead.config_read", format!("failed to read config: {err}"), path)
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    );
    if is_yaml {
        serde_yaml::from_str(&contents).map_err(|err| config_error("mead.config_yaml", err, path))
    } else {
        serde_json::from_str(&contents).map_err(|err| config_error("mead.config_json", err, path))
    }
}

/// Resolves `config` into a parsed document.
///
/// Objects and arrays are returned untouched. Anything else is treated as a
/// path; `name` identifies the expected config in the error when the path does
/// not exist.
pub fn read_config_file_or_json(
    config: impl Into<ConfigSource>,
    name: &str,
) -> Result<Value, MeadError> {
    let path = match config.into() {
        ConfigSource::Inline(value @ (Value::Object(_) | Value::Array(_))) => return Ok(value),
        ConfigSource::Inline(Value::String(path)) => PathBuf::from(path),
        ConfigSource::Inline(other) => {
            return Err(MeadError::Config(
                ErrorInfo::new(
                    "mead.config_missing",
                    format!("Expected {name} config file or a JSON object."),
                )
                .with_context("value", other.to_string())
                .with_hint("pass a path to a JSON or YAML file, or an inline object"),
            ))
        }
        ConfigSource::Path(path) => path,
    };
    let path = expand_user(&path);
    if path.exists() {
        return read_config_file(&path);
    }
    Err(MeadError::Config(
        ErrorInfo::new(
            "mead.config_missing",
            format!("Expected {name} config file or a JSON object."),
        )
        .with_path(&path)
        .with_hint("check the path, `~` is expanded to the home directory"),
    ))
}

/// Loads the optional mead settings document, defaulting to an empty object.
pub fn get_mead_settings(source: Option<ConfigSource>) -> Result<Value, MeadError> {
    match source {
        None => Ok(Value::Object(Map::new())),
        Some(source) => read_config_file_or_json(source, "mead settings"),
    }
}

/// Writes `value` as indented JSON to `path`.
pub fn write_json(value: &Value, path: &Path) -> Result<(), MeadError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| config_error("mead.json_encode", err, path))?;
    fs::write(path, text).map_err(|err| config_error("mead.json_write", err, path))
}

/// Keys a list of objects by their `label` field.
pub fn index_by_label(objects: &[Value]) -> Result<Map<String, Value>, MeadError> {
    let mut indexed = Map::new();
    for (idx, object) in objects.iter().enumerate() {
        let label = object.get("label").and_then(Value::as_str).ok_or_else(|| {
            MeadError::Config(
                ErrorInfo::new("mead.label_missing", "object has no string `label` field")
                    .with_context("index", idx.to_string()),
            )
        })?;
        indexed.insert(label.to_string(), object.clone());
    }
    Ok(indexed)
}

/// Resolves `path` relative to `loc` unless it already names a file or is a
/// `$`-prefixed placeholder.
///
/// Without `loc` the directory holding the running executable is used.
pub fn convert_path(path: &str, loc: Option<&Path>) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_file() || path.starts_with('$') {
        return candidate.to_path_buf();
    }
    let base = match loc {
        Some(loc) => loc.to_path_buf(),
        None => env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    base.join(candidate)
}

/// Parses the usual yes/no spellings into a boolean.
pub fn str2bool(value: &str) -> Result<bool, MeadError> {
    match value.to_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Ok(true),
        "no" | "false" | "f" | "n" | "0" => Ok(false),
        _ => Err(MeadError::Args(
            ErrorInfo::new("mead.bool_expected", "Boolean value expected.")
                .with_context("value", value),
        )),
    }
}

/// Coerces a JSON boolean or a yes/no string into a boolean.
pub fn value_to_bool(value: &Value) -> Result<bool, MeadError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => str2bool(text),
        other => Err(MeadError::Args(
            ErrorInfo::new("mead.bool_expected", "Boolean value expected.")
                .with_context("value", other.to_string()),
        )),
    }
}
