use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

use vibraprep_core::validation::validate_table;
use vibraprep_core::{sample_at, PreprocessError, BROADBAND_COLUMN, DATETIME_COLUMN};

fn at(date: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap()
}

#[test]
fn sorts_rows_and_drops_unparseable_values() -> anyhow::Result<()> {
    let raw = df!(
        "time" => &[
            "2024-01-03 00:00:00",
            "garbage",
            "2024-01-01 00:00:00",
            "2024-01-02 00:00:00",
            "2024-01-04 00:00:00",
        ],
        "amplitude" => &["0.3", "0.9", "0.1", "n/a", "0.4"],
        "ignored" => &[1i64, 2, 3, 4, 5],
    )?;

    let validated = validate_table(&raw, "time", "amplitude")?;

    assert_eq!(validated.height(), 3);
    assert_eq!(
        validated.get_column_names_str(),
        vec![DATETIME_COLUMN, BROADBAND_COLUMN]
    );
    assert_eq!(
        validated.column(DATETIME_COLUMN)?.dtype(),
        &DataType::Datetime(TimeUnit::Microseconds, None)
    );

    let broadband: Vec<Option<f64>> = validated.column(BROADBAND_COLUMN)?.f64()?.into_iter().collect();
    assert_eq!(broadband, vec![Some(0.1), Some(0.3), Some(0.4)]);

    let first = sample_at(&validated, 0)?.unwrap();
    assert_eq!(first.timestamp, at("2024-01-01 00:00:00"));
    assert_eq!(first.moving_average, None);
    let last = sample_at(&validated, 2)?.unwrap();
    assert_eq!(last.timestamp, at("2024-01-04 00:00:00"));
    assert!(sample_at(&validated, 3)?.is_none());

    Ok(())
}

#[test]
fn equal_timestamps_keep_input_order() -> anyhow::Result<()> {
    let raw = df!(
        "datetime" => &["2024-01-02 00:00:00", "2024-01-01 00:00:00", "2024-01-01 00:00:00"],
        "broadband" => &[3.0f64, 1.0, 2.0],
    )?;

    let validated = validate_table(&raw, "datetime", "broadband")?;
    let broadband: Vec<Option<f64>> = validated.column(BROADBAND_COLUMN)?.f64()?.into_iter().collect();
    assert_eq!(broadband, vec![Some(1.0), Some(2.0), Some(3.0)]);
    Ok(())
}

#[test]
fn negative_and_non_finite_amplitudes_are_dropped() -> anyhow::Result<()> {
    let raw = df!(
        "datetime" => &[
            "2024-01-01 00:00:00",
            "2024-01-02 00:00:00",
            "2024-01-03 00:00:00",
            "2024-01-04 00:00:00",
        ],
        "broadband" => &[Some(0.5f64), Some(-0.2), Some(f64::NAN), None],
    )?;

    let validated = validate_table(&raw, "datetime", "broadband")?;
    assert_eq!(validated.height(), 1);
    Ok(())
}

#[test]
fn accepts_datetime_columns_in_any_unit() -> anyhow::Result<()> {
    let base = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let millis = vec![
        base.and_utc().timestamp_millis() + 60_000,
        base.and_utc().timestamp_millis(),
    ];
    let timestamps = Series::new("recorded_at".into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    let raw = DataFrame::new(vec![
        timestamps.into(),
        Series::new("tve".into(), vec![1i32, 2]).into(),
    ])?;

    let validated = validate_table(&raw, "recorded_at", "tve")?;
    let first = sample_at(&validated, 0)?.unwrap();
    assert_eq!(first.timestamp, base);
    assert_eq!(first.broadband, 2.0);
    Ok(())
}

#[test]
fn minute_resolution_strings_are_parsed() -> anyhow::Result<()> {
    let raw = df!(
        "datetime" => &["2024-01-01 00:05", "2024-01-01 00:00"],
        "broadband" => &[0.2f64, 0.1],
    )?;

    let validated = validate_table(&raw, "datetime", "broadband")?;
    assert_eq!(validated.height(), 2);
    let first = sample_at(&validated, 0)?.unwrap();
    assert_eq!(first.timestamp, at("2024-01-01 00:00:00"));
    assert_eq!(first.broadband, 0.1);
    Ok(())
}

#[test]
fn out_of_range_dates_are_dropped() -> anyhow::Result<()> {
    let days = Series::new("day".into(), vec![i32::MAX, 19_723]).cast(&DataType::Date)?;
    let raw = DataFrame::new(vec![
        days.into(),
        Series::new("broadband".into(), vec![0.4f64, 0.5]).into(),
    ])?;

    let validated = validate_table(&raw, "day", "broadband")?;
    assert_eq!(validated.height(), 1);
    let only = sample_at(&validated, 0)?.unwrap();
    assert_eq!(only.timestamp, at("2024-01-01 00:00:00"));
    assert_eq!(only.broadband, 0.5);
    Ok(())
}

#[test]
fn missing_columns_are_validation_errors() -> anyhow::Result<()> {
    let raw = df!(
        "datetime" => &["2024-01-01 00:00:00"],
        "broadband" => &[0.5f64],
    )?;

    let err = validate_table(&raw, "timestamp", "broadband").unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(err, PreprocessError::MissingColumn { ref column } if column == "timestamp"));

    let err = validate_table(&raw, "datetime", "tve").unwrap_err();
    assert!(matches!(err, PreprocessError::MissingColumn { ref column } if column == "tve"));
    Ok(())
}

#[test]
fn table_with_no_usable_rows_is_rejected() -> anyhow::Result<()> {
    let raw = df!(
        "datetime" => &["yesterday", "tomorrow"],
        "broadband" => &[0.5f64, 0.6],
    )?;

    let err = validate_table(&raw, "datetime", "broadband").unwrap_err();
    assert!(matches!(err, PreprocessError::Validation(_)));
    Ok(())
}

#[test]
fn unsupported_dtypes_are_rejected() -> anyhow::Result<()> {
    let raw = df!(
        "datetime" => &[true, false],
        "broadband" => &[0.5f64, 0.6],
    )?;
    assert!(validate_table(&raw, "datetime", "broadband")
        .unwrap_err()
        .is_validation());

    let raw = df!(
        "datetime" => &["2024-01-01 00:00:00", "2024-01-02 00:00:00"],
        "broadband" => &[true, false],
    )?;
    assert!(validate_table(&raw, "datetime", "broadband")
        .unwrap_err()
        .is_validation());
    Ok(())
}
