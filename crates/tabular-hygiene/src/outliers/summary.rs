//! Consolidated outlier report.

use polars::prelude::*;
use serde::Serialize;

use super::bounds::OutlierBounds;

/// Statistic labels of the transposed view, in row order.
pub const SUMMARY_STATISTICS: [&str; 11] = [
    "min",
    "q1",
    "median",
    "q3",
    "max",
    "iqr",
    "lower_bound",
    "upper_bound",
    "skewness",
    "outliers",
    "outlier_pct",
];

/// Statistics of one analyzed column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSummaryRow {
    pub column: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub skewness: f64,
    pub outliers: usize,
    /// Share of `reference_rows`, as a percentage
    pub outlier_percentage: f64,
}

impl OutlierSummaryRow {
    pub(crate) fn new(
        column: &str,
        sorted: &[f64],
        bounds: OutlierBounds,
        median: f64,
        skewness: f64,
        outliers: usize,
        reference_rows: usize,
    ) -> Self {
        Self {
            column: column.to_string(),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q1: bounds.q1,
            median,
            q3: bounds.q3,
            max: sorted.last().copied().unwrap_or(f64::NAN),
            iqr: bounds.iqr,
            lower_bound: bounds.lower,
            upper_bound: bounds.upper,
            skewness,
            outliers,
            outlier_percentage: crate::utils::percentage(outliers, reference_rows),
        }
    }

    /// Cells of this row in [`SUMMARY_STATISTICS`] order.
    fn cells(&self) -> Vec<String> {
        vec![
            format_stat(self.min),
            format_stat(self.q1),
            format_stat(self.median),
            format_stat(self.q3),
            format_stat(self.max),
            format_stat(self.iqr),
            format_stat(self.lower_bound),
            format_stat(self.upper_bound),
            format_stat(self.skewness),
            self.outliers.to_string(),
            format!("{:.2}%", self.outlier_percentage),
        ]
    }
}

/// Outlier statistics for a set of columns, sorted by outlier count
/// descending. Columns with equal counts keep their requested order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSummary {
    /// Row count of the dataset when the summary was taken
    pub reference_rows: usize,
    pub rows: Vec<OutlierSummaryRow>,
}

impl OutlierSummary {
    pub(crate) fn new(reference_rows: usize, mut rows: Vec<OutlierSummaryRow>) -> Self {
        rows.sort_by(|a, b| b.outliers.cmp(&a.outliers));
        Self {
            reference_rows,
            rows,
        }
    }

    pub fn get(&self, column: &str) -> Option<&OutlierSummaryRow> {
        self.rows.iter().find(|row| row.column == column)
    }

    /// Transposed view: a `statistic` label column, then one text column
    /// per analyzed column with one row per statistic.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.rows.len() + 1);
        columns.push(Series::new("statistic".into(), SUMMARY_STATISTICS.to_vec()).into());
        for row in &self.rows {
            columns.push(Series::new(row.column.as_str().into(), row.cells()).into());
        }
        DataFrame::new(columns)
    }
}

fn format_stat(value: f64) -> String {
    format!("{value:.2}")
}
