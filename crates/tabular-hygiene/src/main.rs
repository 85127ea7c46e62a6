//! CLI entry point for the data-quality report.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use polars::prelude::*;
use serde_json::json;
use tabular_hygiene::utils::{column_names, is_numeric_dtype};
use tabular_hygiene::{
    CleaningConfig, ImputationStrategy, MissingValueAnalyzer, MissingValueImputer, OutlierEngine,
    OutlierTreatment,
};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Data-quality checks for tabular extracts",
    long_about = "Measures missing values, literal zeros and IQR outliers of a CSV file.\n\n\
                  EXAMPLES:\n  \
                  # Report on every numeric column\n  \
                  tabular-hygiene report -i sales.csv\n\n  \
                  # Semicolon-separated file, two columns, clip outliers\n  \
                  tabular-hygiene report -i sales.csv -s ';' -c AMOUNT,QTY --treatment clip\n\n  \
                  # Machine-readable output\n  \
                  tabular-hygiene report -i sales.csv --json | jq .missing"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print missingness, zero-value and outlier reports for a CSV file
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Path to the CSV file to analyze
    #[arg(short, long)]
    input: PathBuf,

    /// Field separator of the CSV file
    #[arg(short, long, default_value = ",")]
    separator: char,

    /// Columns to analyze for outliers (comma-separated)
    ///
    /// Defaults to every numeric column
    #[arg(short, long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Outlier treatment applied after reporting (count, clip, remove)
    ///
    /// Overrides the treatment of --config
    #[arg(long)]
    treatment: Option<OutlierTreatment>,

    /// Impute the analyzed columns before outlier analysis (ffill, bfill, mean, median, mode)
    ///
    /// Defaults to the imputation of --config when a config file is given
    #[arg(long)]
    impute: Option<ImputationStrategy>,

    /// JSON file holding a cleaning configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON to stdout instead of human-readable tables
    ///
    /// Disables all logs; only the final JSON report is written.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Report(args) => {
            init_logging(&args.log_level, args.quiet, args.json);
            run_report(&args)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<CleaningConfig> {
    let Some(path) = path else {
        return Ok(CleaningConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read config file {}", path.display()))?;
    let config: CleaningConfig = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    config.validate()?;
    debug!(?config, "Loaded configuration");
    Ok(config)
}

fn load_csv(path: &PathBuf, separator: char) -> Result<DataFrame> {
    if !separator.is_ascii() {
        bail!("Separator must be a single ASCII character, got '{separator}'");
    }
    if !path.exists() {
        bail!("Input file not found: {}", path.display());
    }

    info!("Loading dataset from: {}", path.display());
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator as u8)
                .with_quote_char(Some(b'"')),
        )
        .try_into_reader_with_file_path(Some(path.clone()))?
        .finish()?;
    info!("Dataset loaded successfully: {:?}", df.shape());
    Ok(df)
}

/// Requested columns, or every numeric column when none were given.
fn analyzed_columns(df: &DataFrame, requested: &[String]) -> Vec<String> {
    if !requested.is_empty() {
        return requested.to_vec();
    }
    df.get_columns()
        .iter()
        .filter(|column| is_numeric_dtype(column.dtype()))
        .map(|column| column.name().to_string())
        .collect()
}

/// Columns with at least one present value; the others have no statistics.
fn summarizable_columns(
    engine: &OutlierEngine,
    df: &DataFrame,
    columns: &[String],
) -> Result<Vec<String>> {
    let mut kept = Vec::with_capacity(columns.len());
    for column in columns {
        if engine.bounds(df, column)?.is_some() {
            kept.push(column.clone());
        } else {
            warn!(%column, "Column has no values, skipped in outlier summary");
        }
    }
    Ok(kept)
}

fn run_report(args: &ReportArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let treatment = args.treatment.unwrap_or(config.outlier_treatment);
    let imputation = args
        .impute
        .clone()
        .or_else(|| args.config.as_ref().map(|_| config.imputation.clone()));

    let mut df = load_csv(&args.input, args.separator)?;
    let rows_loaded = df.height();
    let columns = analyzed_columns(&df, &args.columns);
    if columns.is_empty() {
        warn!("No numeric columns to analyze for outliers");
    }

    let analyzer = MissingValueAnalyzer::new();
    let cells_missing = analyzer.percentage_missing(&df);
    let rows_missing = analyzer.percentage_rows_with_missing(&df);
    let missing = analyzer.missing_report(&df);
    let zeros = analyzer.zero_value_report(&df)?;

    if let Some(strategy) = &imputation {
        let imputer = MissingValueImputer::new();
        for column in &columns {
            imputer.impute(&mut df, column, strategy)?;
        }
    }

    let engine = OutlierEngine::new();
    let summary = engine.summary(&df, &summarizable_columns(&engine, &df, &columns)?)?;
    let (treated, counts) = engine.treat(df, &columns, treatment)?;

    if args.json {
        let report = json!({
            "input": args.input.display().to_string(),
            "rows": rows_loaded,
            "columns": column_names(&treated),
            "cells_missing_pct": cells_missing,
            "rows_missing_pct": rows_missing,
            "missing": missing,
            "zeros": zeros,
            "outliers": counts,
            "outlier_summary": summary,
            "treatment": treatment,
            "rows_after_treatment": treated.height(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    // User-facing output goes to stdout regardless of log level.
    println!("\n{}", "=".repeat(80));
    println!("DATA QUALITY REPORT");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input.display());
    println!("  Rows: {rows_loaded}");
    println!("  Columns: {}", treated.width());
    println!("  Cells missing: {cells_missing:.2}%");
    println!("  Rows with missing values: {rows_missing:.2}%");
    println!();

    println!("MISSING VALUES");
    println!("{}", "-".repeat(40));
    if missing.is_empty() {
        println!("  No missing values found");
    } else {
        println!(
            "  {} of {} columns have missing values",
            missing.columns_with_issues(),
            missing.total_columns
        );
        println!("{}", missing.to_frame()?);
    }
    println!();

    println!("ZERO VALUES");
    println!("{}", "-".repeat(40));
    if zeros.is_empty() {
        println!("  No zero values found in numeric columns");
    } else {
        println!(
            "  {} of {} columns have zero values",
            zeros.columns_with_issues(),
            zeros.total_columns
        );
        println!("{}", zeros.to_frame()?);
    }
    println!();

    println!("OUTLIERS (IQR x 1.5)");
    println!("{}", "-".repeat(40));
    if summary.rows.is_empty() {
        println!("  No columns analyzed");
    } else {
        println!("{}", summary.to_frame()?);
        let labels = engine.outlier_percentage(&counts);
        for (entry, label) in counts.columns.iter().zip(labels) {
            println!("  {:<24} {:>8} outliers ({label})", entry.column, entry.count);
        }
    }
    println!();

    match treatment {
        OutlierTreatment::CountOnly => {}
        OutlierTreatment::Clip => println!("Clipped outliers in {} column(s)", columns.len()),
        OutlierTreatment::Remove => println!(
            "Removed {} row(s) holding outliers, {} remain",
            rows_loaded - treated.height(),
            treated.height()
        ),
    }
    println!("{}", "=".repeat(80));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_all_null_column_is_left_out_of_summary() {
        let df = df!(
            "EMPTY" => &[None::<f64>, None, None],
            "V" => &[Some(1.0), Some(2.0), Some(3.0)]
        )
        .unwrap();
        let engine = OutlierEngine::new();
        let columns = vec!["EMPTY".to_string(), "V".to_string()];

        let kept = summarizable_columns(&engine, &df, &columns).unwrap();
        assert_eq!(kept, vec!["V".to_string()]);

        let summary = engine.summary(&df, &kept).unwrap();
        assert_eq!(summary.rows.len(), 1);
    }

    #[test]
    fn test_default_columns_are_numeric() {
        let df = df!("NAME" => &["a"], "N" => &[1i64], "X" => &[0.5]).unwrap();
        assert_eq!(
            analyzed_columns(&df, &[]),
            vec!["N".to_string(), "X".to_string()]
        );
    }
}
