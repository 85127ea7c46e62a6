//! Tabular Data Hygiene Library
//!
//! A data-quality toolkit for messy tabular extracts, built with Rust and Polars.
//!
//! # Overview
//!
//! The library is a set of independent engines operating on a Polars
//! [`DataFrame`](polars::prelude::DataFrame):
//!
//! - **Type Coercion**: text, strict and nullable integers, floats, dates and numeric rescaling
//! - **Missingness Analysis**: dataset, row and column level missing-value measures, zero counts
//! - **Imputation**: forward/backward fill, mean, median, mode and constant strategies
//! - **Outliers**: IQR (Tukey) fences, counting, removal, clipping and a summary report
//! - **Reconciliation**: key-based enrichment of a dataset with columns from another
//! - **Temporal Grids**: dense date × category grids over the observed date range
//! - **Sanitizing**: duplicates, incomplete rows, unwanted columns, key standardization
//!
//! Engines hold no dataset. Every diagnostic they produce is delivered as a
//! [`CleaningEvent`] to an [`EventReporter`], which defaults to structured
//! `tracing` output.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use polars::prelude::*;
//! use tabular_hygiene::{CleaningConfig, MissingValueAnalyzer, OutlierEngine, TypeCoercer};
//!
//! let mut df = CsvReadOptions::default()
//!     .try_into_reader_with_file_path(Some("sales.csv".into()))?
//!     .finish()?;
//!
//! let config = CleaningConfig::default();
//! TypeCoercer::from_config(&config).to_datetime(&mut df, &["DATE"])?;
//!
//! let analyzer = MissingValueAnalyzer::new();
//! println!("{:.2}% of cells missing", analyzer.percentage_missing(&df));
//!
//! let engine = OutlierEngine::new();
//! let counts = engine.count_outliers(&df, &["AMOUNT"])?;
//! let df = engine.clip_outliers(df, &["AMOUNT"])?;
//! ```
//!
//! # Observing events
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tabular_hygiene::{CollectingEventReporter, MissingValueImputer, ImputationStrategy};
//!
//! let reporter = Arc::new(CollectingEventReporter::new());
//! let imputer = MissingValueImputer::with_reporter(reporter.clone());
//! imputer.impute(&mut df, "AMOUNT", &ImputationStrategy::Median)?;
//!
//! for event in reporter.take() {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod events;
pub mod imputers;
pub mod outliers;
pub mod quality;
pub mod reconcile;
pub mod temporal;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{DatasetSanitizer, TypeCoercer};
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, DateFallback, DateParsePolicy,
    FillValue, ImputationStrategy, JoinKind, OutlierTreatment,
};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use events::{
    CleaningEvent, ClosureEventReporter, CollectingEventReporter, EventReporter,
    TracingEventReporter,
};
pub use imputers::{Imputed, MissingValueImputer};
pub use outliers::{OutlierBounds, OutlierCounts, OutlierEngine, OutlierSummary};
pub use quality::MissingValueAnalyzer;
pub use reconcile::DatasetReconciler;
pub use temporal::{GRID_DATE_COLUMN, TemporalGridBuilder};
pub use types::{ColumnIssue, ColumnIssueReport, IssueKind, MissingnessReport, ZeroReport};
pub use utils::{DtypeCategory, get_dtype_category, is_datetime_dtype, is_numeric_dtype};
