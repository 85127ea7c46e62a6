//! Row and column hygiene operations.

use std::sync::Arc;

use polars::prelude::*;
use tracing::debug;

use super::type_coercer::coerce_datetime;
use crate::config::{CleaningConfig, DEFAULT_KEY_MAX_CHARS, DateParsePolicy};
use crate::error::Result;
use crate::events::{CleaningEvent, EventReporter, default_reporter};
use crate::utils::{is_datetime_dtype, require_column, require_columns};

/// Removes duplicates, incomplete rows and unwanted columns, standardizes
/// key columns and orders rows by date.
pub struct DatasetSanitizer {
    policy: DateParsePolicy,
    key_max_chars: usize,
    reporter: Arc<dyn EventReporter>,
}

impl Default for DatasetSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetSanitizer {
    pub fn new() -> Self {
        Self {
            policy: DateParsePolicy::default(),
            key_max_chars: DEFAULT_KEY_MAX_CHARS,
            reporter: default_reporter(),
        }
    }

    pub fn from_config(config: &CleaningConfig) -> Self {
        Self::new()
            .with_date_policy(config.date_policy())
            .with_key_max_chars(config.key_max_chars)
    }

    pub fn with_key_max_chars(mut self, max_chars: usize) -> Self {
        self.key_max_chars = max_chars;
        self
    }

    pub fn with_date_policy(mut self, policy: DateParsePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn EventReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Drop repeated rows, keeping the first occurrence in original order.
    ///
    /// Returns the number of rows removed.
    pub fn remove_duplicate_rows(&self, df: &mut DataFrame) -> Result<usize> {
        let before = df.height();
        *df = df
            .clone()
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;
        let removed = before - df.height();

        debug!(before, after = df.height(), "Removed duplicate rows");
        self.reporter.report(CleaningEvent::RowsDropped {
            reason: "duplicate".to_string(),
            rows: removed,
        });
        Ok(removed)
    }

    /// Drop every row holding at least one null.
    pub fn drop_rows_with_missing(&self, df: &mut DataFrame) -> Result<usize> {
        let before = df.height();
        *df = df.clone().lazy().drop_nulls(None).collect()?;
        let removed = before - df.height();

        self.reporter.report(CleaningEvent::RowsDropped {
            reason: "missing values".to_string(),
            rows: removed,
        });
        Ok(removed)
    }

    /// Drop the named columns. Unknown names fail before anything is dropped.
    pub fn drop_columns<S: AsRef<str>>(&self, df: &mut DataFrame, columns: &[S]) -> Result<usize> {
        require_columns(df, columns)?;

        let names: Vec<PlSmallStr> = columns.iter().map(|c| c.as_ref().into()).collect();
        let before = df.width();
        *df = df.drop_many(names);
        let dropped = before - df.width();

        self.reporter.report(CleaningEvent::ColumnsDropped {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        });
        Ok(dropped)
    }

    /// Turn a key column into trimmed text of at most `max_chars` characters,
    /// then drop rows whose key is null.
    ///
    /// Returns the number of rows dropped.
    pub fn standardize_key_column(
        &self,
        df: &mut DataFrame,
        column: &str,
        max_chars: usize,
    ) -> Result<usize> {
        let series = require_column(df, column)?;
        let text = series.cast(&DataType::String)?;
        let keys: Vec<Option<String>> = text
            .str()?
            .into_iter()
            .map(|value| value.map(|v| v.trim().chars().take(max_chars).collect()))
            .collect();
        let keys = Series::new(series.name().clone(), keys);
        let present = keys.is_not_null();

        df.replace(column, keys)?;
        let before = df.height();
        *df = df.filter(&present)?;
        let rows_dropped = before - df.height();

        self.reporter.report(CleaningEvent::KeyStandardized {
            column: column.to_string(),
            max_chars,
            rows_dropped,
        });
        Ok(rows_dropped)
    }

    /// [`standardize_key_column`](Self::standardize_key_column) with the
    /// sanitizer's key length.
    pub fn standardize_key(&self, df: &mut DataFrame, column: &str) -> Result<usize> {
        self.standardize_key_column(df, column, self.key_max_chars)
    }

    /// Stable sort by a date column, nulls last.
    ///
    /// A column that is not temporal yet is coerced with the sanitizer's
    /// date policy first.
    pub fn sort_by_date(&self, df: &mut DataFrame, column: &str, ascending: bool) -> Result<()> {
        let series = require_column(df, column)?;
        if !is_datetime_dtype(series.dtype()) {
            let (dates, nulled) = coerce_datetime(series, &self.policy)?;
            if nulled > 0 {
                debug!(column, nulled, "Unparsable dates sort last");
            }
            df.replace(column, dates)?;
        }

        *df = df.sort(
            [column],
            SortMultipleOptions::default()
                .with_order_descending(!ascending)
                .with_nulls_last(true)
                .with_maintain_order(true),
        )?;

        self.reporter.report(CleaningEvent::RowsSorted {
            column: column.to_string(),
            ascending,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CleaningError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_remove_duplicate_rows_keeps_first() {
        let mut df = df!(
            "ID" => &[1, 2, 1, 3, 2],
            "X" => &["a", "b", "a", "c", "b"]
        )
        .unwrap();

        let removed = DatasetSanitizer::new().remove_duplicate_rows(&mut df).unwrap();

        assert_eq!(removed, 2);
        let ids: Vec<Option<i32>> = df.column("ID").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_drop_rows_with_missing() {
        let mut df = df!(
            "A" => &[Some(1), None, Some(3)],
            "B" => &[Some("x"), Some("y"), None]
        )
        .unwrap();

        let removed = DatasetSanitizer::new().drop_rows_with_missing(&mut df).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_drop_columns_unknown_name() {
        let mut df = df!("A" => &[1], "B" => &[2]).unwrap();
        let sanitizer = DatasetSanitizer::new();

        let err = sanitizer.drop_columns(&mut df, &["A", "Z"]).unwrap_err();
        assert!(matches!(err, CleaningError::ColumnNotFound(_)));
        assert_eq!(df.width(), 2);

        assert_eq!(sanitizer.drop_columns(&mut df, &["A"]).unwrap(), 1);
        assert_eq!(crate::utils::column_names(&df), vec!["B".to_string()]);
    }

    #[test]
    fn test_standardize_key_column() {
        let mut df = df!(
            "KEY" => &[Some("  ABCDEFGHIJKLMNOPQ "), None, Some("xy ")],
            "V" => &[1, 2, 3]
        )
        .unwrap();

        let dropped = DatasetSanitizer::new()
            .standardize_key_column(&mut df, "KEY", 15)
            .unwrap();

        assert_eq!(dropped, 1);
        let keys: Vec<Option<&str>> = df.column("KEY").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(keys, vec![Some("ABCDEFGHIJKLMNO"), Some("xy")]);
    }

    #[test]
    fn test_standardize_key_uses_configured_length() {
        let config = CleaningConfig::builder().key_max_chars(4).build().unwrap();
        let mut df = df!("KEY" => &[" SKU-0001", "SKU-0002 "]).unwrap();

        DatasetSanitizer::from_config(&config)
            .standardize_key(&mut df, "KEY")
            .unwrap();

        let keys: Vec<Option<&str>> = df.column("KEY").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(keys, vec![Some("SKU-"), Some("SKU-")]);
    }

    #[test]
    fn test_standardize_numeric_key() {
        let mut df = df!("KEY" => &[1001i64, 2002]).unwrap();
        DatasetSanitizer::new()
            .standardize_key_column(&mut df, "KEY", 3)
            .unwrap();

        let keys: Vec<Option<&str>> = df.column("KEY").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(keys, vec![Some("100"), Some("200")]);
    }

    #[test]
    fn test_sort_by_date_parses_text() {
        let mut df = df!(
            "DATE" => &[Some("03/01/2024"), None, Some("01/01/2024"), Some("02/01/2024")],
            "V" => &[3, 0, 1, 2]
        )
        .unwrap();

        DatasetSanitizer::new()
            .sort_by_date(&mut df, "DATE", true)
            .unwrap();

        let values: Vec<Option<i32>> = df.column("V").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1), Some(2), Some(3), Some(0)]);
        assert!(is_datetime_dtype(df.column("DATE").unwrap().dtype()));
    }

    #[test]
    fn test_sort_by_date_descending() {
        let mut df = df!(
            "DATE" => &["01/01/2024", "03/01/2024", "02/01/2024"],
            "V" => &[1, 3, 2]
        )
        .unwrap();

        DatasetSanitizer::new()
            .sort_by_date(&mut df, "DATE", false)
            .unwrap();

        let values: Vec<Option<i32>> = df.column("V").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(3), Some(2), Some(1)]);
    }
}
