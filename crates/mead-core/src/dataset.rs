//! Dataset index lookup with date-stamped key resolution.

use chrono::NaiveDate;
use log::info;
use serde_json::{Map, Value};

use crate::errors::{ErrorInfo, MeadError};

/// Date layouts accepted in the suffix of a dataset key, in priority order.
pub const KNOWN_DATE_FORMATS: [&str; 7] = [
    "%Y%m%d", "%Y-%m-%d", "%Y/%m/%d", "%Y", "%Y%m", "%Y-%m", "%Y/%m",
];

fn is_two_digit_month(field: &str) -> bool {
    matches!(field.as_bytes(), [b'1', b'0'..=b'2'] | [b'0', b'1'..=b'9'])
}

fn is_two_digit_day(field: &str) -> bool {
    matches!(
        field.as_bytes(),
        [b'3', b'0'..=b'1'] | [b'1'..=b'2', b'0'..=b'9'] | [b'0', b'1'..=b'9']
    )
}

fn is_one_digit(field: &str) -> bool {
    matches!(field.as_bytes(), [b'1'..=b'9'])
}

/// Parses `%Y%m%d` (or `%Y%m` without `with_day`) stamps without separators.
///
/// Month and day may be one or two digits. A two-digit month is tried first,
/// so `201711` reads as 2017-01-01 while `2017115` reads as 2017-11-05.
fn parse_compact(text: &str, with_day: bool) -> Option<NaiveDate> {
    if !text.is_ascii() || text.len() < 5 {
        return None;
    }
    let (year, rest) = text.split_at(4);
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (month, day) = [2, 1]
        .into_iter()
        .filter(|len| *len <= rest.len())
        .map(|len| rest.split_at(len))
        .find(|(month, day)| {
            let month_ok = if month.len() == 2 {
                is_two_digit_month(month)
            } else {
                is_one_digit(month)
            };
            let day_ok = if with_day {
                is_two_digit_day(day) || is_one_digit(day)
            } else {
                day.is_empty()
            };
            month_ok && day_ok
        })?;
    let day = if with_day { day.parse().ok()? } else { 1 };
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day)
}

fn parse_with_format(text: &str, format: &str) -> Option<NaiveDate> {
    // Formats without a day (or month) pin the missing fields to 1.
    match format {
        "%Y%m%d" => parse_compact(text, true),
        "%Y" => {
            if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            NaiveDate::parse_from_str(&format!("{text}-01-01"), "%Y-%m-%d").ok()
        }
        "%Y%m" => parse_compact(text, false),
        "%Y-%m" => NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d").ok(),
        "%Y/%m" => NaiveDate::parse_from_str(&format!("{text}/01"), "%Y/%m/%d").ok(),
        full => NaiveDate::parse_from_str(text, full).ok(),
    }
}

/// Parses a date stamp using the first matching entry of [`KNOWN_DATE_FORMATS`].
pub fn parse_date(text: &str) -> Result<NaiveDate, MeadError> {
    KNOWN_DATE_FORMATS
        .iter()
        .find_map(|format| parse_with_format(text, format))
        .ok_or_else(|| {
            MeadError::Dataset(
                ErrorInfo::new("mead.datestamp", format!("Couldn't parse datestamp {text}"))
                    .with_context("datestamp", text),
            )
        })
}

/// Finds the dataset registered under `key`.
///
/// Exact matches win. Otherwise every key containing `key` is considered and
/// the one whose `:`-suffix carries the most recent date is returned.
pub fn get_dataset_from_key<'a>(
    key: &str,
    datasets: &'a Map<String, Value>,
) -> Result<&'a Value, MeadError> {
    if let Some(dataset) = datasets.get(key) {
        return Ok(dataset);
    }

    let mut latest: Option<(NaiveDate, &'a Value)> = None;
    for (candidate, dataset) in datasets {
        if !candidate.contains(key) {
            continue;
        }
        let stamp = candidate.rsplit(':').next().unwrap_or(candidate);
        let Ok(date) = parse_date(stamp) else {
            continue;
        };
        if latest.map_or(true, |(best, _)| date > best) {
            latest = Some((date, dataset));
        }
    }

    latest.map(|(_, dataset)| dataset).ok_or_else(|| {
        MeadError::Dataset(
            ErrorInfo::new(
                "mead.dataset_missing",
                format!("No dataset could be found with key {key}"),
            )
            .with_context("key", key),
        )
    })
}

fn required_field<'a>(dataset: &'a Value, field: &str) -> Result<&'a Value, MeadError> {
    dataset.get(field).ok_or_else(|| {
        MeadError::Dataset(
            ErrorInfo::new("mead.dataset_field", format!("dataset is missing `{field}`"))
                .with_context("field", field),
        )
    })
}

fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Logs the files referenced by a dataset entry on the `mead` target.
pub fn print_dataset_info(dataset: &Value) -> Result<(), MeadError> {
    for (label, field) in [
        ("train file", "train_file"),
        ("valid file", "valid_file"),
        ("test file", "test_file"),
    ] {
        let value = required_field(dataset, field)?;
        info!(target: "mead", "[{label}]: {}", display(value));
    }
    for (label, field) in [("vocab file", "vocab_file"), ("label file", "label_file")] {
        if let Some(value) = dataset.get(field).filter(|value| !value.is_null()) {
            info!(target: "mead", "[{label}]: {}", display(value));
        }
    }
    Ok(())
}
