use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use polars::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vibraprep_core::{
    Preprocessor, PreprocessorConfig, ResultBundle, BROADBAND_COLUMN, DATETIME_COLUMN,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Vibration data preprocessing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean, smooth and summarise a CSV of broadband vibration readings
    Run(RunArgs),
    /// Print the default configuration as TOML
    Defaults,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// CSV file with a header row
    #[arg(short, long)]
    input: PathBuf,
    #[arg(long, default_value = DATETIME_COLUMN)]
    datetime_col: String,
    #[arg(long, default_value = BROADBAND_COLUMN)]
    broadband_col: String,
    /// TOML file with moving_average_window / min_tve / outlier_std_threshold
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    window: Option<usize>,
    #[arg(long)]
    min_tve: Option<f64>,
    #[arg(long)]
    outlier_std: Option<f64>,
    /// Where to write the processed series as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Where to write the removed outliers as CSV
    #[arg(long)]
    outliers: Option<PathBuf>,
    /// Where to write the JSON summary (stdout when omitted)
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Defaults => {
            let rendered = toml::to_string_pretty(&PreprocessorConfig::default())
                .context("failed to render default configuration")?;
            print!("{rendered}");
            Ok(())
        }
    }
}

fn handle_run(args: RunArgs) -> Result<()> {
    let config = load_config(&args)?;
    let raw = read_csv(&args.input)?;
    info!(path = %args.input.display(), rows = raw.height(), "loaded input table");

    let preprocessor = Preprocessor::new(config)?;
    let mut bundle = preprocessor
        .preprocess(&raw, &args.datetime_col, &args.broadband_col)
        .with_context(|| format!("failed to preprocess {}", args.input.display()))?;

    if let Some(path) = &args.output {
        write_csv(&mut bundle.processed_data, path)?;
        info!(path = %path.display(), "wrote processed series");
    }
    if let Some(path) = &args.outliers {
        write_csv(&mut bundle.removed_outliers, path)?;
        info!(path = %path.display(), "wrote removed outliers");
    }

    let summary = serde_json::to_string_pretty(&bundle.summary())
        .context("failed to serialise summary")?;
    match &args.summary {
        Some(path) => {
            fs::write(path, summary)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote summary");
        }
        None => println!("{summary}"),
    }

    print_report(&bundle)?;
    Ok(())
}

fn load_config(args: &RunArgs) -> Result<PreprocessorConfig> {
    let base = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            PreprocessorConfig::from_toml_str(&content)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => PreprocessorConfig::default(),
    };

    let config = PreprocessorConfig::new(
        args.window.unwrap_or(base.moving_average_window),
        args.min_tve.unwrap_or(base.min_tve),
        args.outlier_std.unwrap_or(base.outlier_std_threshold),
    )?;
    Ok(config)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("failed to read CSV {}", path.display()))
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn print_report(bundle: &ResultBundle) -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec![
        "Period",
        "Index",
        "Timestamp",
        "Month",
        "Days from start",
        "Broadband",
        "Moving average",
    ]);
    for (period, point) in bundle.reference_points.iter() {
        table.add_row(vec![
            period.to_string(),
            point.index.to_string(),
            point.timestamp.to_string(),
            point.month_label.clone(),
            point.days_from_start.to_string(),
            format!("{:.4}", point.broadband),
            format!("{:.4}", point.moving_average),
        ]);
    }
    eprintln!("{table}");

    let bounds = &bundle.iqr_bounds;
    eprintln!(
        "outlier threshold {:.4} | removed {} | deviation Q1 {:.4} Q3 {:.4} IQR {:.4} upper {:.4} | anomalies {}",
        bundle.outlier_threshold,
        bundle.removed_outliers.height(),
        bounds.q1,
        bounds.q3,
        bounds.iqr,
        bounds.upper_bound,
        bundle.anomalies()?.height(),
    );
    Ok(())
}
