//! Data quality diagnostics.
//!
//! This module measures missingness at dataset, row and column level and
//! counts literal zeros in numeric columns. Nothing here mutates the dataset.

mod analyzer;

pub use analyzer::MissingValueAnalyzer;
