//! Parsing of `--base:special value` overrides from the command line.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::str2bool;
use crate::errors::{ErrorInfo, MeadError};

/// Value of an extra argument after type inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraArgValue {
    /// Matched one of the yes/no spellings.
    Bool(bool),
    /// Parsed as a number.
    Float(f64),
    /// Anything else, kept verbatim.
    Str(String),
}

impl ExtraArgValue {
    /// Converts the value into a JSON value for merging into configs.
    pub fn to_value(&self) -> Value {
        match self {
            ExtraArgValue::Bool(flag) => Value::Bool(*flag),
            ExtraArgValue::Float(number) => serde_json::Number::from_f64(*number)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(number.to_string())),
            ExtraArgValue::Str(text) => Value::String(text.clone()),
        }
    }
}

/// Parsed overrides grouped as `base -> special -> value`.
pub type ExtraArgs = BTreeMap<String, BTreeMap<String, ExtraArgValue>>;

/// Tries boolean, then floating point, then falls back to the raw string.
pub fn infer_type_or_str(raw: &str) -> ExtraArgValue {
    if let Ok(flag) = str2bool(raw) {
        return ExtraArgValue::Bool(flag);
    }
    match raw.trim().parse::<f64>() {
        Ok(number) => ExtraArgValue::Float(number),
        Err(_) => ExtraArgValue::Str(raw.to_string()),
    }
}

fn split_flag(token: &str) -> Option<(&str, Option<&str>)> {
    let name = token.trim_start_matches('-');
    if name.len() == token.len() || name.is_empty() {
        return None;
    }
    match name.split_once('=') {
        Some((name, value)) => Some((name, Some(value))),
        None => Some((name, None)),
    }
}

/// Matches plain negative numbers such as `-12`, `-1.5` and `-.5`.
fn is_negative_number(token: &str) -> bool {
    let Some(digits) = token.strip_prefix('-') else {
        return false;
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    match digits.split_once('.') {
        Some((int, frac)) => all_digits(int) && !frac.is_empty() && all_digits(frac),
        None => !digits.is_empty() && all_digits(digits),
    }
}

fn is_value_token(token: &str) -> bool {
    !token.starts_with('-') || token == "-" || is_negative_number(token)
}

/// Collects `--{base}:{special}` overrides for every name in `base_args`.
///
/// Each recognized flag takes one value, either inline after `=` or as the
/// next token. Unrecognized tokens are skipped and later occurrences of a flag
/// replace earlier ones. Every base name is present in the result.
pub fn parse_extra_args<B, E>(base_args: &[B], extra_args: &[E]) -> Result<ExtraArgs, MeadError>
where
    B: AsRef<str>,
    E: AsRef<str>,
{
    let mut settings: ExtraArgs = base_args
        .iter()
        .map(|base| (base.as_ref().to_string(), BTreeMap::new()))
        .collect();

    let mut idx = 0;
    while idx < extra_args.len() {
        let token = extra_args[idx].as_ref();
        idx += 1;
        let Some((name, inline)) = split_flag(token) else {
            continue;
        };
        let Some((base, special)) = name.split_once(':') else {
            continue;
        };
        let Some(group) = settings.get_mut(base) else {
            continue;
        };
        let raw = match inline {
            Some(value) => value,
            None => match extra_args.get(idx).map(AsRef::as_ref) {
                Some(next) if is_value_token(next) => {
                    idx += 1;
                    next
                }
                _ => {
                    return Err(MeadError::Args(
                        ErrorInfo::new("mead.args_value", "expected one argument")
                            .with_context("flag", token),
                    ))
                }
            },
        };
        group.insert(special.to_string(), infer_type_or_str(raw));
    }
    Ok(settings)
}

/// Writes parsed overrides into `config` as `config[base][special] = value`.
///
/// Missing or non-object sections are replaced by fresh objects.
pub fn apply_extra_args(config: &mut Value, settings: &ExtraArgs) {
    if !config.is_object() {
        *config = Value::Object(Map::new());
    }
    for (base, specials) in settings {
        if specials.is_empty() {
            continue;
        }
        let Value::Object(root) = config else {
            return;
        };
        let section = root
            .entry(base.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !section.is_object() {
            *section = Value::Object(Map::new());
        }
        if let Value::Object(section) = section {
            for (special, value) in specials {
                section.insert(special.clone(), value.to_value());
            }
        }
    }
}
