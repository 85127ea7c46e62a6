use std::sync::Arc;

use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::bounds::{OutlierBounds, quantile, skewness};
use super::summary::{OutlierSummary, OutlierSummaryRow};
use crate::config::OutlierTreatment;
use crate::error::{CleaningError, Result};
use crate::events::{CleaningEvent, EventReporter, default_reporter};
use crate::utils::{numeric_column, percentage, require_columns, sorted_present_values};

/// Outlier count of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnOutliers {
    pub column: String,
    pub count: usize,
}

/// Outlier counts together with the row count they are relative to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlierCounts {
    /// Row count of the dataset when the counts were taken
    pub reference_rows: usize,
    /// One entry per requested column, in request order
    pub columns: Vec<ColumnOutliers>,
}

impl OutlierCounts {
    pub fn get(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|entry| entry.column == column)
            .map(|entry| entry.count)
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(|entry| entry.count).sum()
    }

    /// `count / reference_rows × 100` per column, in entry order.
    pub fn percentages(&self) -> Vec<f64> {
        self.columns
            .iter()
            .map(|entry| percentage(entry.count, self.reference_rows))
            .collect()
    }
}

/// IQR-fence outlier counting, removal, clipping and reporting.
///
/// The engine holds no dataset: every operation derives fresh fences from
/// the frame it is given. Operations that change rows or values take the
/// frame by value and hand back the result.
///
/// # Example
///
/// ```rust,ignore
/// use tabular_hygiene::OutlierEngine;
///
/// let engine = OutlierEngine::new();
/// let counts = engine.count_outliers(&df, &["PRICE"])?;
/// let df = engine.clip_outliers(df, &["PRICE"])?;
/// ```
pub struct OutlierEngine {
    reporter: Arc<dyn EventReporter>,
}

impl Default for OutlierEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlierEngine {
    pub fn new() -> Self {
        Self {
            reporter: default_reporter(),
        }
    }

    pub fn with_reporter(reporter: Arc<dyn EventReporter>) -> Self {
        Self { reporter }
    }

    /// Fences of one numeric column. `None` when it has no present values.
    pub fn bounds(&self, df: &DataFrame, column: &str) -> Result<Option<OutlierBounds>> {
        let series = numeric_column(df, column)?;
        Ok(OutlierBounds::from_sorted(&sorted_present_values(&series)?))
    }

    /// Count values strictly outside each column's fences.
    pub fn count_outliers<S: AsRef<str>>(
        &self,
        df: &DataFrame,
        columns: &[S],
    ) -> Result<OutlierCounts> {
        require_columns(df, columns)?;

        let mut counts = Vec::with_capacity(columns.len());
        for column in columns {
            let column = column.as_ref();
            let series = numeric_column(df, column)?;
            let count = match OutlierBounds::from_sorted(&sorted_present_values(&series)?) {
                Some(bounds) => count_outside(&series, &bounds)?,
                None => 0,
            };
            counts.push(ColumnOutliers {
                column: column.to_string(),
                count,
            });
        }

        Ok(OutlierCounts {
            reference_rows: df.height(),
            columns: counts,
        })
    }

    /// Percentage strings such as `"20.00%"`, one per counted column.
    pub fn outlier_percentage(&self, counts: &OutlierCounts) -> Vec<String> {
        counts
            .percentages()
            .into_iter()
            .map(|pct| format!("{pct:.2}%"))
            .collect()
    }

    /// Drop rows with out-of-fence values, one column at a time.
    ///
    /// Each column's fences are computed on the frame left by the previous
    /// column. Rows where the column is null are kept.
    pub fn remove_outliers<S: AsRef<str>>(&self, df: DataFrame, columns: &[S]) -> Result<DataFrame> {
        require_columns(&df, columns)?;
        let rows_before = df.height();
        let mut df = df;

        for column in columns {
            let column = column.as_ref();
            let series = numeric_column(&df, column)?;
            let Some(bounds) = OutlierBounds::from_sorted(&sorted_present_values(&series)?) else {
                continue;
            };

            let keep: Vec<bool> = series
                .f64()?
                .into_iter()
                .map(|v| v.is_none_or(|v| !bounds.is_outlier(v)))
                .collect();
            let mask = BooleanChunked::from_slice("keep".into(), &keep);
            let before = df.height();
            df = df.filter(&mask)?;
            debug!(
                column,
                lower = bounds.lower,
                upper = bounds.upper,
                removed = before - df.height(),
                "Removed outlier rows"
            );
        }

        self.reporter.report(CleaningEvent::OutliersRemoved {
            columns: names(columns),
            rows_before,
            rows_after: df.height(),
        });
        Ok(df)
    }

    /// Replace out-of-fence values with the nearest fence.
    ///
    /// Row count is unchanged. Clipped columns become `Float64`. Fences are
    /// derived from the frame as given, so clipping an already clipped
    /// column can move values again; use
    /// [`clip_outliers_with`](Self::clip_outliers_with) to hold them fixed.
    pub fn clip_outliers<S: AsRef<str>>(&self, df: DataFrame, columns: &[S]) -> Result<DataFrame> {
        require_columns(&df, columns)?;
        let mut df = df;
        let mut values_clipped = 0;

        for column in columns {
            let column = column.as_ref();
            let series = numeric_column(&df, column)?;
            let Some(bounds) = OutlierBounds::from_sorted(&sorted_present_values(&series)?) else {
                df.replace(column, series)?;
                continue;
            };

            let (clipped, count) = clip_to(&series, &bounds)?;
            values_clipped += count;
            df.replace(column, clipped)?;
        }

        self.reporter.report(CleaningEvent::OutliersClipped {
            columns: names(columns),
            values_clipped,
        });
        Ok(df)
    }

    /// Count values of `column` strictly outside fixed `bounds`.
    pub fn count_outliers_with(
        &self,
        df: &DataFrame,
        column: &str,
        bounds: &OutlierBounds,
    ) -> Result<usize> {
        count_outside(&numeric_column(df, column)?, bounds)
    }

    /// Clip `column` to fixed `bounds`.
    ///
    /// Clipping again with the same bounds changes nothing, and a
    /// [`count_outliers_with`](Self::count_outliers_with) against them is 0.
    pub fn clip_outliers_with(
        &self,
        df: DataFrame,
        column: &str,
        bounds: &OutlierBounds,
    ) -> Result<DataFrame> {
        let mut df = df;
        let series = numeric_column(&df, column)?;
        let (clipped, values_clipped) = clip_to(&series, bounds)?;
        df.replace(column, clipped)?;

        self.reporter.report(CleaningEvent::OutliersClipped {
            columns: vec![column.to_string()],
            values_clipped,
        });
        Ok(df)
    }

    /// Per-column statistics, sorted by outlier count descending.
    ///
    /// Fails with [`CleaningError::NoValidValues`] for a column without
    /// present values.
    pub fn summary<S: AsRef<str>>(&self, df: &DataFrame, columns: &[S]) -> Result<OutlierSummary> {
        require_columns(df, columns)?;
        let reference_rows = df.height();

        let mut rows = Vec::with_capacity(columns.len());
        for column in columns {
            let column = column.as_ref();
            let series = numeric_column(df, column)?;
            let sorted = sorted_present_values(&series)?;
            let (Some(bounds), Some(median)) =
                (OutlierBounds::from_sorted(&sorted), quantile(&sorted, 0.5))
            else {
                return Err(CleaningError::NoValidValues(column.to_string()));
            };
            let outliers = sorted.iter().filter(|v| bounds.is_outlier(**v)).count();

            rows.push(OutlierSummaryRow::new(
                column,
                &sorted,
                bounds,
                median,
                skewness(&sorted),
                outliers,
                reference_rows,
            ));
        }

        Ok(OutlierSummary::new(reference_rows, rows))
    }

    /// Apply the configured treatment.
    ///
    /// Counts are taken before treatment; the frame is returned treated.
    pub fn treat<S: AsRef<str>>(
        &self,
        df: DataFrame,
        columns: &[S],
        treatment: OutlierTreatment,
    ) -> Result<(DataFrame, OutlierCounts)> {
        let counts = self.count_outliers(&df, columns)?;
        let df = match treatment {
            OutlierTreatment::CountOnly => df,
            OutlierTreatment::Clip => self.clip_outliers(df, columns)?,
            OutlierTreatment::Remove => self.remove_outliers(df, columns)?,
        };
        Ok((df, counts))
    }
}

fn count_outside(series: &Series, bounds: &OutlierBounds) -> Result<usize> {
    Ok(series
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| bounds.is_outlier(*v))
        .count())
}

/// Clipped copy of a `Float64` series and the number of values moved.
fn clip_to(series: &Series, bounds: &OutlierBounds) -> Result<(Series, usize)> {
    let mut moved = 0;
    let clipped: Vec<Option<f64>> = series
        .f64()?
        .into_iter()
        .map(|v| {
            v.map(|v| {
                if bounds.is_outlier(v) {
                    moved += 1;
                }
                bounds.clip(v)
            })
        })
        .collect();
    Ok((Series::new(series.name().clone(), clipped), moved))
}

fn names<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    columns.iter().map(|c| c.as_ref().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventReporter;
    use pretty_assertions::assert_eq;

    fn prices() -> DataFrame {
        df!(
            "PRICE" => &[10.0, 12.0, 11.0, 13.0, 1000.0],
            "QTY" => &[1i64, 2, 3, 4, 5]
        )
        .unwrap()
    }

    #[test]
    fn test_bounds() {
        let bounds = OutlierEngine::new().bounds(&prices(), "PRICE").unwrap().unwrap();
        assert_eq!(bounds.upper, 16.0);
        assert_eq!(bounds.lower, 8.0);
    }

    #[test]
    fn test_bounds_of_all_null_column() {
        let df = df!("V" => &[None::<f64>, None]).unwrap();
        assert_eq!(OutlierEngine::new().bounds(&df, "V").unwrap(), None);
    }

    #[test]
    fn test_count_outliers_and_percentage() {
        let engine = OutlierEngine::new();
        let counts = engine.count_outliers(&prices(), &["PRICE", "QTY"]).unwrap();

        assert_eq!(counts.reference_rows, 5);
        assert_eq!(counts.get("PRICE"), Some(1));
        assert_eq!(counts.get("QTY"), Some(0));
        assert_eq!(counts.total(), 1);
        assert_eq!(
            engine.outlier_percentage(&counts),
            vec!["20.00%".to_string(), "0.00%".to_string()]
        );
    }

    #[test]
    fn test_count_outliers_rejects_text_column() {
        let df = df!("NAME" => &["a", "b"]).unwrap();
        let err = OutlierEngine::new().count_outliers(&df, &["NAME"]).unwrap_err();
        assert!(matches!(err, CleaningError::NotNumeric { .. }));
    }

    #[test]
    fn test_count_outliers_unknown_column() {
        let err = OutlierEngine::new()
            .count_outliers(&prices(), &["PRICE", "NOPE"])
            .unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_remove_outliers_keeps_nulls() {
        let df = df!(
            "V" => &[Some(10.0), None, Some(12.0), Some(11.0), Some(13.0), Some(1000.0)]
        )
        .unwrap();

        let reporter = Arc::new(CollectingEventReporter::new());
        let engine = OutlierEngine::with_reporter(reporter.clone());
        let df = engine.remove_outliers(df, &["V"]).unwrap();

        assert_eq!(df.height(), 5);
        assert_eq!(df.column("V").unwrap().null_count(), 1);
        assert_eq!(
            reporter.events(),
            vec![CleaningEvent::OutliersRemoved {
                columns: vec!["V".to_string()],
                rows_before: 6,
                rows_after: 5,
            }]
        );
    }

    #[test]
    fn test_clip_outliers() {
        let engine = OutlierEngine::new();
        let df = engine.clip_outliers(prices(), &["PRICE", "QTY"]).unwrap();

        assert_eq!(df.height(), 5);
        let values: Vec<Option<f64>> = df.column("PRICE").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(
            values,
            vec![Some(10.0), Some(12.0), Some(11.0), Some(13.0), Some(16.0)]
        );
        assert_eq!(df.column("QTY").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_clip_with_fixed_bounds_on_short_column() {
        let df = df!("V" => &[-100.0, 0.0, 1.0, 2.0]).unwrap();
        let engine = OutlierEngine::new();
        let bounds = engine.bounds(&df, "V").unwrap().unwrap();
        assert_eq!(bounds.lower, -64.375);

        let once = engine.clip_outliers_with(df, "V", &bounds).unwrap();
        let values: Vec<Option<f64>> = once.column("V").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(-64.375), Some(0.0), Some(1.0), Some(2.0)]);
        assert_eq!(engine.count_outliers_with(&once, "V", &bounds).unwrap(), 0);

        let twice = engine.clip_outliers_with(once.clone(), "V", &bounds).unwrap();
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn test_summary() {
        let df = df!(
            "PRICE" => &[10.0, 12.0, 11.0, 13.0, 1000.0],
            "FLAT" => &[1.0, 1.0, 1.0, 1.0, 1.0]
        )
        .unwrap();

        let summary = OutlierEngine::new().summary(&df, &["FLAT", "PRICE"]).unwrap();

        assert_eq!(summary.reference_rows, 5);
        assert_eq!(summary.rows[0].column, "PRICE");
        let price = summary.get("PRICE").unwrap();
        assert_eq!(price.min, 10.0);
        assert_eq!(price.median, 12.0);
        assert_eq!(price.max, 1000.0);
        assert_eq!(price.outliers, 1);
        assert_eq!(price.outlier_percentage, 20.0);
        assert_eq!(summary.get("FLAT").unwrap().skewness, 0.0);
    }

    #[test]
    fn test_summary_empty_column() {
        let df = df!("V" => &[None::<f64>, None]).unwrap();
        let err = OutlierEngine::new().summary(&df, &["V"]).unwrap_err();
        assert!(matches!(err, CleaningError::NoValidValues(ref c) if c == "V"));
    }

    #[test]
    fn test_treat_dispatch() {
        let engine = OutlierEngine::new();

        let (df, counts) = engine
            .treat(prices(), &["PRICE"], OutlierTreatment::CountOnly)
            .unwrap();
        assert_eq!(df.height(), 5);
        assert_eq!(counts.get("PRICE"), Some(1));

        let (df, _) = engine
            .treat(prices(), &["PRICE"], OutlierTreatment::Remove)
            .unwrap();
        assert_eq!(df.height(), 4);

        let (df, _) = engine
            .treat(prices(), &["PRICE"], OutlierTreatment::Clip)
            .unwrap();
        let counts = engine.count_outliers(&df, &["PRICE"]).unwrap();
        assert_eq!(counts.get("PRICE"), Some(0));
    }
}
