use serde::{Deserialize, Serialize};

use crate::error::{PreprocessError, Result};

pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 30;
pub const DEFAULT_MIN_TVE: f64 = 0.065;
pub const DEFAULT_OUTLIER_STD_THRESHOLD: f64 = 8.0;

/// Tuning knobs shared by every stage of a run. Read-only once a
/// [`crate::Preprocessor`] owns it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessorConfig {
    pub moving_average_window: usize,
    pub min_tve: f64,
    pub outlier_std_threshold: f64,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            min_tve: DEFAULT_MIN_TVE,
            outlier_std_threshold: DEFAULT_OUTLIER_STD_THRESHOLD,
        }
    }
}

impl PreprocessorConfig {
    pub fn new(
        moving_average_window: usize,
        min_tve: f64,
        outlier_std_threshold: f64,
    ) -> Result<Self> {
        let config = Self {
            moving_average_window,
            min_tve,
            outlier_std_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document; absent keys fall back to the defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)
            .map_err(|err| PreprocessError::InvalidConfig(format!("failed to parse TOML: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.moving_average_window == 0 {
            return Err(PreprocessError::InvalidConfig(
                "moving_average_window must be greater than 0".to_string(),
            ));
        }
        if !self.min_tve.is_finite() || self.min_tve < 0.0 {
            return Err(PreprocessError::InvalidConfig(format!(
                "min_tve must be a finite value >= 0, got {}",
                self.min_tve
            )));
        }
        if !self.outlier_std_threshold.is_finite() || self.outlier_std_threshold <= 0.0 {
            return Err(PreprocessError::InvalidConfig(format!(
                "outlier_std_threshold must be a finite value > 0, got {}",
                self.outlier_std_threshold
            )));
        }
        Ok(())
    }
}
