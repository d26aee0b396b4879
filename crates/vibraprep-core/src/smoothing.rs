use polars::prelude::*;
use tracing::debug;

use crate::config::PreprocessorConfig;
use crate::error::Result;
use crate::types::{broadband_values, MOVING_AVERAGE_COLUMN};

/// Appends a trailing simple moving average of `broadband`. Rows before the
/// first full window average everything seen so far, so every row gets a value.
pub fn apply_moving_average(df: &DataFrame, config: &PreprocessorConfig) -> Result<DataFrame> {
    let values = broadband_values(df)?;
    let averages = trailing_mean(&values, config.moving_average_window);

    debug!(
        window = config.moving_average_window,
        rows = averages.len(),
        "computed moving average"
    );

    let mut output = df.clone();
    output.with_column(Series::new(MOVING_AVERAGE_COLUMN.into(), averages))?;
    Ok(output)
}

fn trailing_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|idx| {
            let count = (idx + 1).min(window);
            let sum: f64 = values[idx + 1 - count..=idx].iter().sum();
            sum / count as f64
        })
        .collect()
}
