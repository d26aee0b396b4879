pub mod config;
pub mod deviation;
pub mod error;
pub mod outliers;
pub mod pipeline;
pub mod reference_points;
pub mod smoothing;
pub mod threshold;
pub mod types;
pub mod validation;

pub use config::PreprocessorConfig;
pub use error::{PreprocessError, Result};
pub use pipeline::{PreprocessSummary, Preprocessor, ResultBundle};
pub use types::{
    sample_at, IqrBounds, ReferencePeriod, ReferencePoint, ReferencePoints, Sample,
    BROADBAND_COLUMN, DATETIME_COLUMN, DEVIATION_COLUMN, MOVING_AVERAGE_COLUMN,
};
