use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PreprocessError, Result};

pub const DATETIME_COLUMN: &str = "datetime";
pub const BROADBAND_COLUMN: &str = "broadband";
pub const MOVING_AVERAGE_COLUMN: &str = "moving_average";
pub const DEVIATION_COLUMN: &str = "deviation";

/// Typed view of one row of a working series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub broadband: f64,
    pub moving_average: Option<f64>,
    pub deviation: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferencePeriod {
    #[serde(rename = "Early_Period")]
    Early,
    #[serde(rename = "Middle_Period")]
    Middle,
    #[serde(rename = "Late_Period")]
    Late,
}

impl ReferencePeriod {
    pub const ALL: [ReferencePeriod; 3] = [
        ReferencePeriod::Early,
        ReferencePeriod::Middle,
        ReferencePeriod::Late,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferencePeriod::Early => "Early_Period",
            ReferencePeriod::Middle => "Middle_Period",
            ReferencePeriod::Late => "Late_Period",
        }
    }
}

impl fmt::Display for ReferencePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ReferencePeriod {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "early_period" | "early" => Ok(ReferencePeriod::Early),
            "middle_period" | "middle" => Ok(ReferencePeriod::Middle),
            "late_period" | "late" => Ok(ReferencePeriod::Late),
            other => Err(format!("unknown reference period '{other}'")),
        }
    }
}

/// Snapshot of a smoothed series at one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub timestamp: NaiveDateTime,
    pub moving_average: f64,
    pub broadband: f64,
    pub month_label: String,
    pub index: usize,
    pub days_from_start: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoints {
    #[serde(rename = "Early_Period")]
    pub early: ReferencePoint,
    #[serde(rename = "Middle_Period")]
    pub middle: ReferencePoint,
    #[serde(rename = "Late_Period")]
    pub late: ReferencePoint,
}

impl ReferencePoints {
    pub fn get(&self, period: ReferencePeriod) -> &ReferencePoint {
        match period {
            ReferencePeriod::Early => &self.early,
            ReferencePeriod::Middle => &self.middle,
            ReferencePeriod::Late => &self.late,
        }
    }

    /// Early, middle, late in that order.
    pub fn iter(&self) -> impl Iterator<Item = (ReferencePeriod, &ReferencePoint)> {
        ReferencePeriod::ALL
            .into_iter()
            .map(move |period| (period, self.get(period)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub upper_bound: f64,
}

pub(crate) fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name).map_err(|_| PreprocessError::MissingColumn {
        column: name.to_string(),
    })
}

/// Reads a Float64 column, rejecting nulls.
pub(crate) fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let values = require_column(df, name)?.f64()?;
    values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| {
            value.ok_or_else(|| {
                PreprocessError::Validation(format!("column '{name}' is null at row {idx}"))
            })
        })
        .collect()
}

pub(crate) fn broadband_values(df: &DataFrame) -> Result<Vec<f64>> {
    f64_values(df, BROADBAND_COLUMN)
}

pub(crate) fn datetime_from_physical(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    };
    dt.map(|dt| dt.naive_utc())
}

/// Builds a working series from microsecond timestamps and amplitudes.
pub(crate) fn build_series_frame(
    timestamps_micros: Vec<i64>,
    broadband: Vec<f64>,
) -> Result<DataFrame> {
    let timestamps = Series::new(DATETIME_COLUMN.into(), timestamps_micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
    let broadband = Series::new(BROADBAND_COLUMN.into(), broadband);
    Ok(DataFrame::new(vec![timestamps.into(), broadband.into()])?)
}

fn optional_f64_at(df: &DataFrame, name: &str, idx: usize) -> Result<Option<f64>> {
    match df.column(name) {
        Ok(column) => Ok(column.f64()?.get(idx)),
        Err(_) => Ok(None),
    }
}

/// Returns the row at `idx`, or `None` when it is out of bounds.
pub fn sample_at(df: &DataFrame, idx: usize) -> Result<Option<Sample>> {
    if idx >= df.height() {
        return Ok(None);
    }

    let timestamps = require_column(df, DATETIME_COLUMN)?.datetime()?;
    let unit = timestamps.time_unit();
    let timestamp = timestamps
        .get(idx)
        .and_then(|value| datetime_from_physical(value, unit))
        .ok_or_else(|| {
            PreprocessError::Validation(format!("column '{DATETIME_COLUMN}' is null at row {idx}"))
        })?;
    let broadband = require_column(df, BROADBAND_COLUMN)?
        .f64()?
        .get(idx)
        .ok_or_else(|| {
            PreprocessError::Validation(format!("column '{BROADBAND_COLUMN}' is null at row {idx}"))
        })?;

    Ok(Some(Sample {
        timestamp,
        broadband,
        moving_average: optional_f64_at(df, MOVING_AVERAGE_COLUMN, idx)?,
        deviation: optional_f64_at(df, DEVIATION_COLUMN, idx)?,
    }))
}
