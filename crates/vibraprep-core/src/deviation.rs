use polars::prelude::*;
use tracing::debug;

use crate::error::{PreprocessError, Result};
use crate::types::{
    broadband_values, f64_values, IqrBounds, DEVIATION_COLUMN, MOVING_AVERAGE_COLUMN,
};

const STAGE: &str = "deviation analysis";
const IQR_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct DeviationAnalysis {
    pub data: DataFrame,
    pub iqr_bounds: IqrBounds,
}

/// Appends `deviation = broadband - moving_average` and derives the IQR upper
/// bound of that column.
pub fn analyze_deviation(df: &DataFrame) -> Result<DeviationAnalysis> {
    if df.height() == 0 {
        return Err(PreprocessError::InsufficientData {
            stage: STAGE,
            required: 1,
            found: 0,
        });
    }

    let broadband = broadband_values(df)?;
    let moving_average = f64_values(df, MOVING_AVERAGE_COLUMN)?;
    let deviations: Vec<f64> = broadband
        .iter()
        .zip(&moving_average)
        .map(|(value, average)| value - average)
        .collect();

    let iqr_bounds = iqr_bounds(&deviations)?;

    let mut data = df.clone();
    data.with_column(Series::new(DEVIATION_COLUMN.into(), deviations))?;

    debug!(
        q1 = iqr_bounds.q1,
        q3 = iqr_bounds.q3,
        upper_bound = iqr_bounds.upper_bound,
        "computed deviation bounds"
    );

    Ok(DeviationAnalysis { data, iqr_bounds })
}

/// Quartiles with linear interpolation and `upper_bound = q3 + 1.5 * iqr`.
pub fn iqr_bounds(values: &[f64]) -> Result<IqrBounds> {
    if values.is_empty() {
        return Err(PreprocessError::InsufficientData {
            stage: STAGE,
            required: 1,
            found: 0,
        });
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = percentile_linear(&sorted, 0.25);
    let q3 = percentile_linear(&sorted, 0.75);
    let iqr = q3 - q1;

    Ok(IqrBounds {
        q1,
        q3,
        iqr,
        upper_bound: q3 + IQR_MULTIPLIER * iqr,
    })
}

/// `sorted` must be non-empty and ascending.
fn percentile_linear(sorted: &[f64], fraction: f64) -> f64 {
    let position = fraction * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
