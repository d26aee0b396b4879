use chrono::{Duration, NaiveDate};
use polars::prelude::*;

use vibraprep_core::deviation::{analyze_deviation, iqr_bounds};
use vibraprep_core::smoothing::apply_moving_average;
use vibraprep_core::threshold::apply_threshold_filter;
use vibraprep_core::validation::validate_table;
use vibraprep_core::{PreprocessorConfig, DEVIATION_COLUMN};

fn smoothed_series(values: &[f64], window: usize) -> DataFrame {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let timestamps: Vec<String> = (0..values.len())
        .map(|idx| (start + Duration::days(idx as i64)).format("%Y-%m-%d").to_string())
        .collect();
    let raw = df!("datetime" => timestamps, "broadband" => values).unwrap();
    let validated = validate_table(&raw, "datetime", "broadband").unwrap();
    let config = PreprocessorConfig::new(window, 0.0, 8.0).unwrap();
    apply_moving_average(&validated, &config).unwrap()
}

#[test]
fn deviation_is_broadband_minus_moving_average() -> anyhow::Result<()> {
    let analysis = analyze_deviation(&smoothed_series(&[1.0, 3.0, 2.0, 6.0], 2))?;

    let deviation: Vec<f64> = analysis
        .data
        .column(DEVIATION_COLUMN)?
        .f64()?
        .into_no_null_iter()
        .collect();
    let expected = [0.0, 1.0, -0.5, 2.0];
    for (actual, expected) in deviation.iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-12);
    }

    let bounds = analysis.iqr_bounds;
    assert!((bounds.q1 - (-0.125)).abs() < 1e-12);
    assert!((bounds.q3 - 1.25).abs() < 1e-12);
    assert!((bounds.iqr - 1.375).abs() < 1e-12);
    assert!((bounds.upper_bound - (1.25 + 1.5 * 1.375)).abs() < 1e-12);
    Ok(())
}

#[test]
fn constant_deviation_has_zero_spread() -> anyhow::Result<()> {
    let analysis = analyze_deviation(&smoothed_series(&[0.5; 12], 5))?;
    let bounds = analysis.iqr_bounds;

    assert_eq!(bounds.iqr, 0.0);
    assert_eq!(bounds.q1, bounds.q3);
    assert_eq!(bounds.upper_bound, bounds.q3);

    let direct = iqr_bounds(&[0.3; 5])?;
    assert_eq!(direct.iqr, 0.0);
    assert_eq!(direct.upper_bound, 0.3);
    Ok(())
}

#[test]
fn bounds_are_ordered() -> anyhow::Result<()> {
    let values: Vec<f64> = (0..97).map(|idx| ((idx * 53) % 17) as f64 * 0.1).collect();
    let bounds = analyze_deviation(&smoothed_series(&values, 7))?.iqr_bounds;

    assert!(bounds.upper_bound >= bounds.q3);
    assert!(bounds.q3 >= bounds.q1);
    assert!(bounds.iqr >= 0.0);
    Ok(())
}

#[test]
fn empty_input_is_insufficient() -> anyhow::Result<()> {
    assert!(iqr_bounds(&[]).unwrap_err().is_insufficient_data());

    let config = PreprocessorConfig::default();
    let empty = apply_threshold_filter(&smoothed_series(&[0.01], 3), &config)?;
    assert!(analyze_deviation(&empty).unwrap_err().is_insufficient_data());
    Ok(())
}
