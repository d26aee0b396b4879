use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::debug;

use crate::error::{PreprocessError, Result};
use crate::types::{build_series_frame, datetime_from_physical, require_column};

const MICROS_PER_DAY: i64 = 86_400 * 1_000_000;

static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Coerces a raw table into a working series: `datetime` (UTC microseconds) and
/// `broadband` (f64), sorted by time. Rows whose timestamp or amplitude cannot
/// be read, or whose amplitude is negative or non-finite, are dropped. Rows
/// sharing a timestamp keep their input order.
pub fn validate_table(
    raw: &DataFrame,
    datetime_col: &str,
    broadband_col: &str,
) -> Result<DataFrame> {
    let timestamps = parse_timestamp_column(require_column(raw, datetime_col)?)?;
    let amplitudes = coerce_amplitude_column(require_column(raw, broadband_col)?)?;
    let amplitudes = amplitudes.f64()?;

    let mut rows: Vec<(i64, f64)> = Vec::with_capacity(raw.height());
    let mut bad_timestamps = 0usize;
    let mut bad_amplitudes = 0usize;

    for (idx, timestamp) in timestamps.iter().enumerate() {
        let Some(timestamp) = *timestamp else {
            bad_timestamps += 1;
            continue;
        };
        match amplitudes.get(idx) {
            Some(value) if value.is_finite() && value >= 0.0 => rows.push((timestamp, value)),
            _ => bad_amplitudes += 1,
        }
    }

    if rows.is_empty() {
        return Err(PreprocessError::Validation(format!(
            "no usable rows in '{datetime_col}'/'{broadband_col}' ({} input rows, {bad_timestamps} bad timestamps, {bad_amplitudes} bad amplitudes)",
            raw.height()
        )));
    }

    rows.sort_by_key(|(timestamp, _)| *timestamp);

    debug!(
        input_rows = raw.height(),
        valid_rows = rows.len(),
        bad_timestamps,
        bad_amplitudes,
        "validated raw table"
    );

    let (timestamps, amplitudes): (Vec<i64>, Vec<f64>) = rows.into_iter().unzip();
    build_series_frame(timestamps, amplitudes)
}

fn parse_timestamp_column(column: &Column) -> Result<Vec<Option<i64>>> {
    match column.dtype() {
        DataType::String => Ok(column
            .str()?
            .into_iter()
            .map(|value| value.and_then(parse_timestamp))
            .collect()),
        DataType::Datetime(_, _) => {
            let values = column.datetime()?;
            let unit = values.time_unit();
            Ok((0..column.len())
                .map(|idx| {
                    values
                        .get(idx)
                        .and_then(|value| datetime_from_physical(value, unit))
                        .map(|dt| dt.and_utc().timestamp_micros())
                })
                .collect())
        }
        DataType::Date => {
            let values = column.date()?;
            Ok((0..column.len())
                .map(|idx| {
                    values
                        .get(idx)
                        .and_then(|days| i64::from(days).checked_mul(MICROS_PER_DAY))
                })
                .collect())
        }
        other => Err(PreprocessError::Validation(format!(
            "column '{}' has unsupported datetime dtype {other}",
            column.name()
        ))),
    }
}

fn coerce_amplitude_column(column: &Column) -> Result<Column> {
    match column.dtype() {
        DataType::Float64
        | DataType::Float32
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::String => Ok(column.cast(&DataType::Float64)?),
        other => Err(PreprocessError::Validation(format!(
            "column '{}' has unsupported amplitude dtype {other}",
            column.name()
        ))),
    }
}

/// Parses a timestamp string into UTC microseconds.
pub(crate) fn parse_timestamp(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_micros());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.and_utc().timestamp_micros());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_micros())
}
