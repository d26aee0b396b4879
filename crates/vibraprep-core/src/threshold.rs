use polars::prelude::*;
use tracing::{debug, warn};

use crate::config::PreprocessorConfig;
use crate::error::Result;
use crate::types::{require_column, BROADBAND_COLUMN};

/// Keeps rows with `broadband >= min_tve`, preserving order. An empty result is
/// returned as-is.
pub fn apply_threshold_filter(df: &DataFrame, config: &PreprocessorConfig) -> Result<DataFrame> {
    let broadband = require_column(df, BROADBAND_COLUMN)?.f64()?;
    let mask = broadband.gt_eq(config.min_tve);
    let filtered = df.filter(&mask)?;

    debug!(
        min_tve = config.min_tve,
        input_rows = df.height(),
        retained_rows = filtered.height(),
        "applied threshold filter"
    );
    if filtered.height() == 0 && df.height() > 0 {
        warn!(min_tve = config.min_tve, "threshold filter removed every row");
    }

    Ok(filtered)
}
