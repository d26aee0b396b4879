use polars::prelude::*;
use tracing::debug;

use crate::config::PreprocessorConfig;
use crate::error::Result;
use crate::types::{broadband_values, require_column, BROADBAND_COLUMN};

#[derive(Debug, Clone)]
pub struct OutlierRemoval {
    /// Normal rows plus every sustained high run, in original order.
    pub retained: DataFrame,
    /// Isolated single-row spikes.
    pub removed: DataFrame,
    /// `mean + outlier_std_threshold * std` (population std). NaN when the
    /// series is empty.
    pub threshold: f64,
}

/// Drops isolated spikes above `mean + k * std` while keeping runs of two or
/// more consecutive high rows, which are treated as genuine sustained events.
/// Adjacency is by row position.
pub fn remove_isolated_outliers(
    df: &DataFrame,
    config: &PreprocessorConfig,
) -> Result<OutlierRemoval> {
    let broadband = require_column(df, BROADBAND_COLUMN)?.f64()?;
    let threshold = match (broadband.mean(), broadband.std(0)) {
        (Some(mean), Some(std)) => mean + config.outlier_std_threshold * std,
        _ => f64::NAN,
    };

    let values = broadband_values(df)?;
    let isolated = if values.len() < 2 {
        vec![false; values.len()]
    } else {
        let high: Vec<bool> = values.iter().map(|value| *value > threshold).collect();
        isolated_spikes(&high)
    };
    let keep: Vec<bool> = isolated.iter().map(|spike| !spike).collect();

    let retained = df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
    let removed = df.filter(&BooleanChunked::from_slice("isolated".into(), &isolated))?;

    debug!(
        threshold,
        input_rows = df.height(),
        removed_rows = removed.height(),
        "removed isolated outliers"
    );

    Ok(OutlierRemoval {
        retained,
        removed,
        threshold,
    })
}

/// Marks every high run of exactly one row. Single pass over run boundaries.
pub(crate) fn isolated_spikes(high: &[bool]) -> Vec<bool> {
    let mut isolated = vec![false; high.len()];
    let mut run_start: Option<usize> = None;

    for (idx, &is_high) in high.iter().enumerate() {
        match (is_high, run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                if idx - start == 1 {
                    isolated[start] = true;
                }
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        if high.len() - start == 1 {
            isolated[start] = true;
        }
    }

    isolated
}
