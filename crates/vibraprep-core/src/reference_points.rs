use chrono::NaiveDateTime;
use polars::prelude::DataFrame;
use tracing::debug;

use crate::config::PreprocessorConfig;
use crate::error::{PreprocessError, Result};
use crate::types::{sample_at, ReferencePoint, ReferencePoints, Sample, MOVING_AVERAGE_COLUMN};

const STAGE: &str = "reference point extraction";

/// Row positions for the early, middle and late reference points of a series of
/// `rows` samples. The early index is the first position with a full window and
/// the late index mirrors it from the end; both are clamped around the middle so
/// `early <= middle <= late`. Short series may collapse onto one index: three
/// rows with a window of two give `[1, 1, 1]`.
pub fn reference_indices(rows: usize, window: usize) -> [usize; 3] {
    if rows == 0 {
        return [0; 3];
    }

    let offset = window.saturating_sub(1);
    let middle = rows / 2;
    let early = (if rows >= window { offset } else { 0 }).min(middle);
    let late = match (rows - 1).checked_sub(offset) {
        Some(candidate) if candidate >= middle => candidate,
        _ => rows - 1,
    };

    [early, middle, late]
}

/// Picks early, middle and late snapshots from a smoothed series.
pub fn extract_reference_points(
    df: &DataFrame,
    config: &PreprocessorConfig,
) -> Result<ReferencePoints> {
    let rows = df.height();
    if rows == 0 {
        return Err(PreprocessError::InsufficientData {
            stage: STAGE,
            required: 1,
            found: 0,
        });
    }

    let first = row(df, 0)?.timestamp;
    let [early, middle, late] = reference_indices(rows, config.moving_average_window);

    debug!(rows, early, middle, late, "selected reference indices");

    Ok(ReferencePoints {
        early: reference_point(df, early, first)?,
        middle: reference_point(df, middle, first)?,
        late: reference_point(df, late, first)?,
    })
}

fn row(df: &DataFrame, idx: usize) -> Result<Sample> {
    sample_at(df, idx)?.ok_or(PreprocessError::InsufficientData {
        stage: STAGE,
        required: idx + 1,
        found: df.height(),
    })
}

fn reference_point(df: &DataFrame, index: usize, first: NaiveDateTime) -> Result<ReferencePoint> {
    let sample = row(df, index)?;
    let moving_average = sample
        .moving_average
        .ok_or_else(|| PreprocessError::MissingColumn {
            column: MOVING_AVERAGE_COLUMN.to_string(),
        })?;

    Ok(ReferencePoint {
        timestamp: sample.timestamp,
        moving_average,
        broadband: sample.broadband,
        month_label: sample.timestamp.format("%B %Y").to_string(),
        index,
        days_from_start: (sample.timestamp - first).num_days(),
    })
}
