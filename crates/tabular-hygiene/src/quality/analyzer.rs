use std::sync::Arc;

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::events::{CleaningEvent, EventReporter, default_reporter};
use crate::types::{ColumnIssue, ColumnIssueReport, IssueKind, MissingnessReport, ZeroReport};
use crate::utils::{is_numeric_dtype, percentage, round2};

/// Read-only missing-value diagnostics.
pub struct MissingValueAnalyzer {
    reporter: Arc<dyn EventReporter>,
}

impl Default for MissingValueAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MissingValueAnalyzer {
    pub fn new() -> Self {
        Self {
            reporter: default_reporter(),
        }
    }

    pub fn with_reporter(reporter: Arc<dyn EventReporter>) -> Self {
        Self { reporter }
    }

    /// Null cells as a percentage of all cells. An empty dataset yields 0.
    pub fn percentage_missing(&self, df: &DataFrame) -> f64 {
        let null_cells: usize = df.get_columns().iter().map(|c| c.null_count()).sum();
        let value = percentage(null_cells, df.height() * df.width());

        self.measured("cells_missing_pct", value);
        value
    }

    /// Rows with at least one null as a percentage of all rows.
    pub fn percentage_rows_with_missing(&self, df: &DataFrame) -> f64 {
        let mut any_null = BooleanChunked::full("any_null".into(), false, df.height());
        for column in df.get_columns() {
            if column.null_count() > 0 {
                any_null = &any_null | &column.is_null();
            }
        }
        let value = percentage(any_null.num_trues(), df.height());

        self.measured("rows_missing_pct", value);
        value
    }

    /// Per-column null counts, excluding complete columns.
    pub fn missing_report(&self, df: &DataFrame) -> MissingnessReport {
        let rows = df.height();
        let entries = df
            .get_columns()
            .iter()
            .map(|column| {
                let count = column.null_count();
                ColumnIssue {
                    column: column.name().to_string(),
                    count,
                    percentage: round2(percentage(count, rows)),
                    dtype: column.dtype().to_string(),
                }
            })
            .collect();

        let report = ColumnIssueReport::new(IssueKind::Missing, rows, df.width(), entries);
        debug!(
            columns = report.total_columns,
            with_missing = report.columns_with_issues(),
            "Built missing value report"
        );
        self.measured("columns_with_missing", report.columns_with_issues() as f64);
        report
    }

    /// Per-column counts of literal zeros in numeric columns.
    pub fn zero_value_report(&self, df: &DataFrame) -> Result<ZeroReport> {
        let rows = df.height();
        let mut entries = Vec::new();

        for column in df.get_columns() {
            if !is_numeric_dtype(column.dtype()) {
                continue;
            }
            let values = column.cast(&DataType::Float64)?;
            let count = values
                .f64()?
                .into_iter()
                .filter(|v| matches!(v, Some(v) if *v == 0.0))
                .count();
            entries.push(ColumnIssue {
                column: column.name().to_string(),
                count,
                percentage: round2(percentage(count, rows)),
                dtype: column.dtype().to_string(),
            });
        }

        let report = ColumnIssueReport::new(IssueKind::Zero, rows, df.width(), entries);
        self.measured("columns_with_zeros", report.columns_with_issues() as f64);
        Ok(report)
    }

    fn measured(&self, measure: &str, value: f64) {
        self.reporter.report(CleaningEvent::MissingnessMeasured {
            measure: measure.to_string(),
            value,
        });
    }
}
