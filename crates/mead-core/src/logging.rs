//! Process-wide logging configured from a JSON logging document.
//!
//! The document mirrors the usual `handlers` / `loggers` / `formatters`
//! layout. [`prepare_logging_config`] applies the per-process overrides
//! (PID-suffixed file names and `*_LOG_LEVEL` environment variables),
//! [`build_log_config`] turns the result into a `log4rs` configuration and
//! [`configure_logger`] installs it once for the whole process.
//!
//! Dotted logger names (`baseline.timing`) map onto `::` separated targets
//! (`baseline::timing`).

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::process;

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::append::Append;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::filter::threshold::ThresholdFilter;
use log4rs::Handle;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::{read_config_file_or_json, ConfigSource};
use crate::errors::{ErrorInfo, MeadError};

/// Entries every logging document has to provide.
pub const REQUIRED_LOGGING_KEYS: [[&str; 2]; 5] = [
    ["handlers", "reporting_file_handler"],
    ["handlers", "timing_file_handler"],
    ["handlers", "reporting_console_handler"],
    ["loggers", "baseline"],
    ["loggers", "mead"],
];

const DEFAULT_FORMAT: &str = "%(message)s";

fn logging_error(code: &str, message: impl Into<String>) -> MeadError {
    MeadError::Logging(ErrorInfo::new(code, message))
}

/// Maps a level name such as `debug` or `WARNING` to a filter, defaulting to `Info`.
pub fn get_logging_level(name: &str) -> LevelFilter {
    match name.trim().to_uppercase().as_str() {
        "TRACE" | "NOTSET" => LevelFilter::Trace,
        "DEBUG" => LevelFilter::Debug,
        "WARNING" | "WARN" => LevelFilter::Warn,
        "ERROR" | "CRITICAL" | "FATAL" => LevelFilter::Error,
        "OFF" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

fn level_name(level: LevelFilter) -> &'static str {
    match level {
        LevelFilter::Off => "OFF",
        LevelFilter::Error => "ERROR",
        LevelFilter::Warn => "WARNING",
        LevelFilter::Info => "INFO",
        LevelFilter::Debug => "DEBUG",
        LevelFilter::Trace => "TRACE",
    }
}

/// Numeric levels follow the 10/20/30/40/50 convention.
fn level_from_value(value: &Value) -> LevelFilter {
    match value {
        Value::String(name) => get_logging_level(name),
        Value::Number(number) => match number.as_u64().unwrap_or(20) {
            0..=9 => LevelFilter::Trace,
            10..=19 => LevelFilter::Debug,
            20..=29 => LevelFilter::Info,
            30..=39 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        },
        _ => LevelFilter::Info,
    }
}

fn section_mut<'a>(
    config: &'a mut Value,
    path: [&str; 2],
) -> Result<&'a mut Map<String, Value>, MeadError> {
    config
        .get_mut(path[0])
        .and_then(|section| section.get_mut(path[1]))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            MeadError::Logging(
                ErrorInfo::new("mead.logging_key", "logging config is missing a required entry")
                    .with_context("key", path.join(".")),
            )
        })
}

/// Loads a logging document and applies the per-process overrides.
///
/// File handlers become `reporting-{pid}.log` / `timing-{pid}.log`.
/// `LOG_LEVEL` (default `INFO`) sets the base level, which
/// `BASELINE_LOG_LEVEL`, `MEAD_LOG_LEVEL` and `REPORTING_LOG_LEVEL` refine.
pub fn prepare_logging_config<F>(
    source: impl Into<ConfigSource>,
    env: F,
    pid: u32,
) -> Result<Value, MeadError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = read_config_file_or_json(source, "logger")?;
    for path in REQUIRED_LOGGING_KEYS {
        section_mut(&mut config, path)?;
    }

    let base = env("LOG_LEVEL").unwrap_or_else(|| "INFO".to_string());
    let level_for = |var: &str| {
        let name = env(var).unwrap_or_else(|| base.clone());
        Value::String(level_name(get_logging_level(&name)).to_string())
    };

    section_mut(&mut config, ["handlers", "reporting_file_handler"])?
        .insert("filename".into(), Value::String(format!("reporting-{pid}.log")));
    section_mut(&mut config, ["handlers", "timing_file_handler"])?
        .insert("filename".into(), Value::String(format!("timing-{pid}.log")));
    section_mut(&mut config, ["loggers", "baseline"])?
        .insert("level".into(), level_for("BASELINE_LOG_LEVEL"));
    section_mut(&mut config, ["loggers", "mead"])?
        .insert("level".into(), level_for("MEAD_LOG_LEVEL"));
    section_mut(&mut config, ["handlers", "reporting_console_handler"])?
        .insert("level".into(), level_for("REPORTING_LOG_LEVEL"));
    Ok(config)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FormatterSpec {
    #[serde(default)]
    format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct HandlerSpec {
    #[serde(default)]
    level: Option<Value>,
    #[serde(default)]
    filename: Option<PathBuf>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    stream: Option<String>,
    #[serde(default)]
    formatter: Option<String>,
}

fn default_propagate() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct LoggerSpec {
    #[serde(default)]
    level: Option<Value>,
    #[serde(default)]
    handlers: Vec<String>,
    #[serde(default = "default_propagate")]
    propagate: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingConfig {
    #[serde(default)]
    formatters: BTreeMap<String, FormatterSpec>,
    #[serde(default)]
    handlers: BTreeMap<String, HandlerSpec>,
    #[serde(default)]
    loggers: BTreeMap<String, LoggerSpec>,
    #[serde(default)]
    root: Option<LoggerSpec>,
}

/// Rewrites a `%(field)s` record format as a `log4rs` pattern.
///
/// Known fields become pattern specifiers, everything else is kept as
/// literal text. A trailing newline is always appended.
pub fn encoder_pattern(format: &str) -> String {
    let mut pattern = String::with_capacity(format.len() + 8);
    let mut rest = format;
    while !rest.is_empty() {
        if let Some(field) = rest.strip_prefix("%(") {
            if let Some((name, after)) = field.split_once(')') {
                let after = after.strip_prefix(['s', 'd']).unwrap_or(after);
                match field_specifier(name) {
                    Some(spec) => pattern.push_str(spec),
                    None => push_literal(&mut pattern, &rest[..rest.len() - after.len()]),
                }
                rest = after;
                continue;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            push_literal(&mut pattern, ch.encode_utf8(&mut [0u8; 4]));
        }
        rest = chars.as_str();
    }
    pattern.push_str("{n}");
    pattern
}

fn field_specifier(name: &str) -> Option<&'static str> {
    match name {
        "asctime" => Some("{d(%Y-%m-%d %H:%M:%S,%3f)}"),
        "name" => Some("{t}"),
        "levelname" => Some("{l}"),
        "message" => Some("{m}"),
        "module" => Some("{M}"),
        "filename" => Some("{f}"),
        "lineno" => Some("{L}"),
        "process" => Some("{P}"),
        "thread" | "threadName" => Some("{T}"),
        _ => None,
    }
}

fn push_literal(pattern: &mut String, text: &str) {
    for ch in text.chars() {
        if matches!(ch, '{' | '}' | '(' | ')' | '\\') {
            pattern.push(ch);
        }
        pattern.push(ch);
    }
}

fn logger_name(dotted: &str) -> String {
    dotted.replace('.', "::")
}

fn handler_appender(
    name: &str,
    spec: &HandlerSpec,
    formatters: &BTreeMap<String, FormatterSpec>,
) -> Result<Appender, MeadError> {
    let format = spec
        .formatter
        .as_ref()
        .and_then(|formatter| formatters.get(formatter))
        .and_then(|formatter| formatter.format.as_deref())
        .unwrap_or(DEFAULT_FORMAT);
    let encoder = Box::new(PatternEncoder::new(&encoder_pattern(format)));
    let append: Box<dyn Append> = match &spec.filename {
        Some(path) => Box::new(
            FileAppender::builder()
                .encoder(encoder)
                .append(spec.mode.as_deref() != Some("w"))
                .build(path)
                .map_err(|err| {
                    MeadError::Logging(
                        ErrorInfo::new("mead.logging_file", err.to_string())
                            .with_context("handler", name)
                            .with_path(path),
                    )
                })?,
        ),
        None => {
            let target = if spec.stream.as_deref() == Some("ext://sys.stdout") {
                Target::Stdout
            } else {
                Target::Stderr
            };
            Box::new(ConsoleAppender::builder().encoder(encoder).target(target).build())
        }
    };
    let mut builder = Appender::builder();
    if let Some(level) = &spec.level {
        builder = builder.filter(Box::new(ThresholdFilter::new(level_from_value(level))));
    }
    Ok(builder.build(name, append))
}

fn known_handlers<'a>(
    logger: &str,
    spec: &'a LoggerSpec,
    handlers: &BTreeMap<String, HandlerSpec>,
) -> Result<&'a [String], MeadError> {
    match spec.handlers.iter().find(|handler| !handlers.contains_key(*handler)) {
        Some(missing) => Err(MeadError::Logging(
            ErrorInfo::new("mead.logging_handler", "logger references an unknown handler")
                .with_context("logger", logger)
                .with_context("handler", missing.as_str()),
        )),
        None => Ok(&spec.handlers),
    }
}

/// Builds a `log4rs` configuration from a prepared logging document.
///
/// Handlers become file or console appenders behind a threshold filter,
/// loggers keep their `propagate` flag as additivity. Loggers without a level
/// use the root level, which defaults to `WARNING`. Log files are opened here.
pub fn build_log_config(config: &Value) -> Result<Config, MeadError> {
    let parsed: LoggingConfig = serde_json::from_value(config.clone())
        .map_err(|err| logging_error("mead.logging_schema", err.to_string()))?;

    let root_level = parsed
        .root
        .as_ref()
        .and_then(|root| root.level.as_ref())
        .map_or(LevelFilter::Warn, level_from_value);

    let mut builder = Config::builder();
    for (name, spec) in &parsed.handlers {
        builder = builder.appender(handler_appender(name, spec, &parsed.formatters)?);
    }
    for (name, spec) in &parsed.loggers {
        let handlers = known_handlers(name, spec, &parsed.handlers)?;
        let level = spec.level.as_ref().map_or(root_level, level_from_value);
        builder = builder.logger(
            Logger::builder()
                .appenders(handlers.iter().cloned())
                .additive(spec.propagate)
                .build(logger_name(name), level),
        );
    }
    let root = match &parsed.root {
        Some(spec) => Root::builder()
            .appenders(known_handlers("root", spec, &parsed.handlers)?.iter().cloned())
            .build(root_level),
        None => Root::builder().build(root_level),
    };
    builder
        .build(root)
        .map_err(|err| logging_error("mead.logging_schema", err.to_string()))
}

/// Installs `config` as the global logger. Fails if a logger is already set.
pub fn install(config: Config) -> Result<Handle, MeadError> {
    log4rs::init_config(config).map_err(|err| {
        MeadError::Logging(
            ErrorInfo::new("mead.logging_installed", err.to_string())
                .with_hint("configure logging once, at process startup"),
        )
    })
}

/// Configures process-wide logging from a logging document or file.
///
/// Call once at startup; a second call returns `mead.logging_installed`.
pub fn configure_logger(source: impl Into<ConfigSource>) -> Result<Handle, MeadError> {
    let config = prepare_logging_config(source, |var| env::var(var).ok(), process::id())?;
    install(build_log_config(&config)?)
}
