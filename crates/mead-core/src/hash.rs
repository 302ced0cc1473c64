//! Config fingerprinting: key exclusion, canonical ordering and SHA-1 digests.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::{Map, Value};
use sha1::{Digest, Sha1};

use crate::errors::{ErrorInfo, MeadError};

/// Dotted path to a config entry, one element per nesting level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// Builds a path from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parses a dotted path such as `train.verbose`.
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.'))
    }

    /// Path segments from the root.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

/// Entries excluded from the fingerprint because they do not change the model.
pub const DEFAULT_EXCLUDED_KEYS: [&str; 13] = [
    "conll_output",
    "visdom",
    "visdom_name",
    "model.gpus",
    "test_thresh",
    "reporting",
    "num_valid_to_show",
    "train.verbose",
    "train.model_base",
    "train.model_zip",
    "train.nsteps",
    "test_batchsz",
    "basedir",
];

/// Set of key paths stripped before hashing.
///
/// The default holds [`DEFAULT_EXCLUDED_KEYS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionKeys {
    paths: Vec<KeyPath>,
}

impl ExclusionKeys {
    /// Creates an exclusion set from explicit paths.
    pub fn new(paths: impl IntoIterator<Item = KeyPath>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Creates an exclusion set from dotted path strings.
    pub fn from_dotted<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(paths.into_iter().map(KeyPath::parse))
    }

    /// Adds one more path to the set.
    pub fn with(mut self, path: KeyPath) -> Self {
        self.paths.push(path);
        self
    }

    /// Iterates over the configured paths.
    pub fn iter(&self) -> impl Iterator<Item = &KeyPath> {
        self.paths.iter()
    }
}

impl Default for ExclusionKeys {
    fn default() -> Self {
        Self::from_dotted(DEFAULT_EXCLUDED_KEYS)
    }
}

/// Returns a copy of `config` with every path in `keys` removed.
///
/// Paths whose intermediate segments are missing, or are not objects, are
/// left alone.
pub fn remove_extra_keys(config: &Value, keys: &ExclusionKeys) -> Value {
    let mut stripped = config.clone();
    for path in keys.iter() {
        let Some((leaf, parents)) = path.segments().split_last() else {
            continue;
        };
        let mut cursor = Some(&mut stripped);
        for segment in parents {
            cursor = cursor.and_then(|node| node.get_mut(segment.as_str()));
        }
        if let Some(Value::Object(map)) = cursor {
            map.shift_remove(leaf.as_str());
        }
    }
    stripped
}

/// Rebuilds `data` with object keys sorted alphabetically at every depth.
///
/// Array element order is kept; objects nested in arrays are sorted too.
pub fn order_json(data: &Value) -> Value {
    match data {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let ordered: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| (key.clone(), order_json(value)))
                .collect();
            Value::Object(ordered)
        }
        Value::Array(values) => Value::Array(values.iter().map(order_json).collect()),
        other => other.clone(),
    }
}

/// Text layout fingerprints are computed over.
///
/// Separators are `", "` and `": "`. Only printable ASCII is written as is;
/// DEL and non-ASCII characters become `\uXXXX` escapes. Floats always show a
/// fraction or an exponent.
struct DumpsFormatter;

impl Formatter for DumpsFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        // Fragments never hold quotes, backslashes or control characters below
        // 0x20; serde_json escapes those itself.
        if fragment.bytes().all(|b| b < 0x7f) {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch < '\x7f' {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }
}

/// Shortest round-trip float text, using positional notation for decimal
/// exponents in `-4..16` and `1e-05` style otherwise.
fn float_repr(value: f64) -> String {
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if (-4..16).contains(&exponent) {
        let point = exponent + 1;
        let text = if point <= 0 {
            format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
        } else if point as usize >= digits.len() {
            format!("{}{}.0", digits, "0".repeat(point as usize - digits.len()))
        } else {
            let (int, frac) = digits.split_at(point as usize);
            format!("{int}.{frac}")
        };
        return format!("{sign}{text}");
    }

    let exp_sign = if exponent < 0 { '-' } else { '+' };
    format!("{sign}{mantissa}e{exp_sign}{:02}", exponent.unsigned_abs())
}

/// Serializes `value` in the stable text layout used for fingerprints.
pub fn to_dumps_string(value: &Value) -> Result<String, MeadError> {
    let mut bytes = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut bytes, DumpsFormatter);
    value
        .serialize(&mut serializer)
        .map_err(|err| MeadError::Hash(ErrorInfo::new("mead.hash_encode", err.to_string())))?;
    String::from_utf8(bytes)
        .map_err(|err| MeadError::Hash(ErrorInfo::new("mead.hash_encode", err.to_string())))
}

/// Computes the SHA-1 fingerprint of a config.
///
/// Entries in `keys` are removed first and object keys are sorted, so configs
/// that only differ in key order or excluded fields share a fingerprint.
pub fn hash_config(config: &Value, keys: &ExclusionKeys) -> Result<String, MeadError> {
    let stripped = remove_extra_keys(config, keys);
    let sorted = order_json(&stripped);
    let text = to_dumps_string(&sorted)?;
    Ok(hex::encode(Sha1::digest(text.as_bytes())))
}
