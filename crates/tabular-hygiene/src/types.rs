use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// What a [`ColumnIssueReport`] counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Null cells
    Missing,
    /// Literal zeros in numeric columns
    Zero,
}

impl IssueKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Zero => "zeros",
        }
    }
}

/// Per-column entry of a missing-value or zero-value report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnIssue {
    /// Name of the column.
    pub column: String,
    /// Number of affected cells.
    pub count: usize,
    /// Share of rows affected, rounded to two decimals.
    pub percentage: f64,
    /// Column data type (as string).
    pub dtype: String,
}

/// Per-column report of missing or zero values.
///
/// Only columns with at least one affected cell are listed, sorted by
/// percentage descending. Ties keep dataset column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnIssueReport {
    pub kind: IssueKind,
    /// Rows in the analyzed dataset.
    pub total_rows: usize,
    /// Columns in the analyzed dataset.
    pub total_columns: usize,
    pub entries: Vec<ColumnIssue>,
}

/// Report of null cells per column.
pub type MissingnessReport = ColumnIssueReport;

/// Report of literal zeros per numeric column.
pub type ZeroReport = ColumnIssueReport;

impl ColumnIssueReport {
    /// Build a report from unsorted per-column entries.
    pub(crate) fn new(
        kind: IssueKind,
        total_rows: usize,
        total_columns: usize,
        mut entries: Vec<ColumnIssue>,
    ) -> Self {
        entries.retain(|entry| entry.count > 0);
        entries.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
        Self {
            kind,
            total_rows,
            total_columns,
            entries,
        }
    }

    /// Number of columns with at least one affected cell.
    pub fn columns_with_issues(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&ColumnIssue> {
        self.entries.iter().find(|entry| entry.column == column)
    }

    /// Tabular view: one row per flagged column.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let columns: Vec<&str> = self.entries.iter().map(|e| e.column.as_str()).collect();
        let counts: Vec<u64> = self.entries.iter().map(|e| e.count as u64).collect();
        let percentages: Vec<f64> = self.entries.iter().map(|e| e.percentage).collect();
        let dtypes: Vec<&str> = self.entries.iter().map(|e| e.dtype.as_str()).collect();

        df!(
            "column" => columns,
            "count" => counts,
            "percentage" => percentages,
            "dtype" => dtypes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(column: &str, count: usize, percentage: f64) -> ColumnIssue {
        ColumnIssue {
            column: column.to_string(),
            count,
            percentage,
            dtype: "i64".to_string(),
        }
    }

    #[test]
    fn test_report_drops_clean_columns_and_sorts() {
        let report = ColumnIssueReport::new(
            IssueKind::Missing,
            4,
            3,
            vec![issue("A", 1, 25.0), issue("B", 0, 0.0), issue("C", 3, 75.0)],
        );

        assert_eq!(report.columns_with_issues(), 2);
        assert_eq!(report.entries[0].column, "C");
        assert_eq!(report.entries[1].column, "A");
        assert!(report.get("B").is_none());
    }

    #[test]
    fn test_report_to_frame() {
        let report =
            ColumnIssueReport::new(IssueKind::Zero, 2, 1, vec![issue("PRICE", 1, 50.0)]);
        let frame = report.to_frame().unwrap();
        assert_eq!(frame.shape(), (1, 4));
    }

    #[test]
    fn test_report_serialization() {
        let report = ColumnIssueReport::new(IssueKind::Missing, 3, 1, vec![issue("X", 2, 66.67)]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"kind\":\"missing\""));
        assert!(json.contains("\"percentage\":66.67"));
    }
}
