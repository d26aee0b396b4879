use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::PreprocessorConfig;
use crate::deviation::analyze_deviation;
use crate::error::Result;
use crate::outliers::remove_isolated_outliers;
use crate::reference_points::extract_reference_points;
use crate::smoothing::apply_moving_average;
use crate::threshold::apply_threshold_filter;
use crate::types::{
    require_column, IqrBounds, ReferencePoints, BROADBAND_COLUMN, DATETIME_COLUMN,
    DEVIATION_COLUMN,
};
use crate::validation::validate_table;

/// Everything produced by one [`Preprocessor::preprocess`] call.
#[derive(Debug, Clone)]
pub struct ResultBundle {
    /// Cleaned series with `moving_average` and `deviation` columns.
    pub processed_data: DataFrame,
    pub removed_outliers: DataFrame,
    pub outlier_threshold: f64,
    pub reference_points: ReferencePoints,
    pub iqr_bounds: IqrBounds,
    pub config: PreprocessorConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreprocessSummary {
    pub processed_rows: usize,
    pub removed_outlier_rows: usize,
    pub outlier_threshold: f64,
    pub reference_points: ReferencePoints,
    pub iqr_bounds: IqrBounds,
    pub config: PreprocessorConfig,
}

impl ResultBundle {
    /// Processed rows whose deviation lies above the IQR upper bound.
    pub fn anomalies(&self) -> Result<DataFrame> {
        let deviation = require_column(&self.processed_data, DEVIATION_COLUMN)?.f64()?;
        let mask = deviation.gt(self.iqr_bounds.upper_bound);
        Ok(self.processed_data.filter(&mask)?)
    }

    pub fn summary(&self) -> PreprocessSummary {
        PreprocessSummary {
            processed_rows: self.processed_data.height(),
            removed_outlier_rows: self.removed_outliers.height(),
            outlier_threshold: self.outlier_threshold,
            reference_points: self.reference_points.clone(),
            iqr_bounds: self.iqr_bounds,
            config: self.config,
        }
    }
}

/// Runs validation, threshold filtering, outlier removal, smoothing,
/// reference point extraction and deviation analysis in that order. Holds no
/// state besides its config, so one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessorConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    /// Like [`Preprocessor::preprocess`] with the `datetime` / `broadband`
    /// column names.
    pub fn preprocess_default(&self, raw: &DataFrame) -> Result<ResultBundle> {
        self.preprocess(raw, DATETIME_COLUMN, BROADBAND_COLUMN)
    }

    pub fn preprocess(
        &self,
        raw: &DataFrame,
        datetime_col: &str,
        broadband_col: &str,
    ) -> Result<ResultBundle> {
        let config = &self.config;

        let validated = validate_table(raw, datetime_col, broadband_col)?;
        let filtered = apply_threshold_filter(&validated, config)?;
        let outliers = remove_isolated_outliers(&filtered, config)?;
        let smoothed = apply_moving_average(&outliers.retained, config)?;
        let reference_points = extract_reference_points(&smoothed, config)?;
        let deviation = analyze_deviation(&smoothed)?;

        info!(
            input_rows = raw.height(),
            validated_rows = validated.height(),
            filtered_rows = filtered.height(),
            removed_outliers = outliers.removed.height(),
            processed_rows = deviation.data.height(),
            outlier_threshold = outliers.threshold,
            "preprocessing complete"
        );

        Ok(ResultBundle {
            processed_data: deviation.data,
            removed_outliers: outliers.removed,
            outlier_threshold: outliers.threshold,
            reference_points,
            iqr_bounds: deviation.iqr_bounds,
            config: *config,
        })
    }
}
