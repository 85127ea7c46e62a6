//! Imputation module for handling missing values.
//!
//! This module provides the fill strategies used on one column at a time:
//! - Positional fills (forward, backward)
//! - Statistical fills (mean, median, mode)
//! - Constant fill with a caller-supplied value

mod fill;
mod statistical;

use std::sync::Arc;

use polars::prelude::*;
use tracing::debug;

use crate::config::ImputationStrategy;
use crate::error::{Result, ResultExt};
use crate::events::{CleaningEvent, EventReporter, default_reporter};
use crate::utils::require_column;

/// A column after imputation and the number of values that were filled.
#[derive(Debug, Clone)]
pub struct Imputed {
    pub series: Series,
    pub filled: usize,
}

/// Applies an [`ImputationStrategy`] to a single column.
///
/// A strategy that does not fit the column type fails with
/// [`CleaningError::Imputation`](crate::error::CleaningError::Imputation)
/// even when the column has no nulls. Otherwise a column without nulls is
/// left untouched and reports 0.
///
/// # Example
///
/// ```rust,ignore
/// use tabular_hygiene::{ImputationStrategy, MissingValueImputer};
///
/// let imputer = MissingValueImputer::new();
/// let filled = imputer.impute(&mut df, "PRICE", &ImputationStrategy::Median)?;
/// ```
pub struct MissingValueImputer {
    reporter: Arc<dyn EventReporter>,
}

impl Default for MissingValueImputer {
    fn default() -> Self {
        Self::new()
    }
}

impl MissingValueImputer {
    pub fn new() -> Self {
        Self {
            reporter: default_reporter(),
        }
    }

    pub fn with_reporter(reporter: Arc<dyn EventReporter>) -> Self {
        Self { reporter }
    }

    /// Impute a standalone column.
    pub fn impute_series(&self, series: &Series, strategy: &ImputationStrategy) -> Result<Imputed> {
        check_applicable(series, strategy)?;

        let before = series.null_count();
        if before == 0 {
            return Ok(Imputed {
                series: series.clone(),
                filled: 0,
            });
        }

        let imputed = match strategy {
            ImputationStrategy::ForwardFill => fill::forward_fill(series)?,
            ImputationStrategy::BackwardFill => fill::backward_fill(series)?,
            ImputationStrategy::Mean => statistical::mean_fill(series)?,
            ImputationStrategy::Median => statistical::median_fill(series)?,
            ImputationStrategy::Mode => statistical::mode_fill(series)?,
            ImputationStrategy::Constant(value) => fill::constant_fill(series, value)?,
        };
        let filled = before.saturating_sub(imputed.null_count());

        debug!(
            column = %series.name(),
            strategy = strategy.name(),
            filled,
            remaining = imputed.null_count(),
            "Imputed column"
        );
        self.reporter.report(CleaningEvent::ValuesImputed {
            column: series.name().to_string(),
            strategy: strategy.name().to_string(),
            filled,
        });

        Ok(Imputed {
            series: imputed,
            filled,
        })
    }

    /// Impute one column of a dataset in place and return how many values were filled.
    pub fn impute(
        &self,
        df: &mut DataFrame,
        column: &str,
        strategy: &ImputationStrategy,
    ) -> Result<usize> {
        let series = require_column(df, column)?;
        let Imputed { series, filled } = self.impute_series(series, strategy)?;
        if filled > 0 {
            df.replace(column, series)
                .context(format!("Failed to write imputed column '{column}'"))?;
        }
        Ok(filled)
    }
}

/// Type checks that hold whether or not the column has nulls.
fn check_applicable(series: &Series, strategy: &ImputationStrategy) -> Result<()> {
    match strategy {
        ImputationStrategy::Mean | ImputationStrategy::Median => {
            statistical::require_numeric(series, strategy.name())
        }
        ImputationStrategy::Constant(value) => fill::constant_for(series, value).map(|_| ()),
        ImputationStrategy::ForwardFill
        | ImputationStrategy::BackwardFill
        | ImputationStrategy::Mode => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FillValue;
    use crate::events::CollectingEventReporter;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_complete_column_is_untouched() {
        let mut df = df!("v" => &[1i64, 2, 3]).unwrap();
        let imputer = MissingValueImputer::new();

        for strategy in [
            ImputationStrategy::ForwardFill,
            ImputationStrategy::Mean,
            ImputationStrategy::Mode,
            ImputationStrategy::Constant(FillValue::Int(0)),
        ] {
            assert_eq!(imputer.impute(&mut df, "v", &strategy).unwrap(), 0);
        }
        assert_eq!(df.column("v").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_type_mismatch_fails_on_complete_column() {
        let mut df = df!("s" => &["a", "b"], "n" => &[1i64, 2]).unwrap();
        let imputer = MissingValueImputer::new();

        for strategy in [ImputationStrategy::Mean, ImputationStrategy::Median] {
            let err = imputer.impute(&mut df, "s", &strategy).unwrap_err();
            assert_eq!(err.error_code(), "IMPUTATION_FAILED");
        }
        let err = imputer
            .impute(&mut df, "n", &ImputationStrategy::Constant(FillValue::Text("x".to_string())))
            .unwrap_err();
        assert_eq!(err.error_code(), "IMPUTATION_FAILED");
        assert_eq!(df.column("s").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_impute_reports_filled_count() {
        let reporter = Arc::new(CollectingEventReporter::new());
        let imputer = MissingValueImputer::with_reporter(reporter.clone());
        let mut df = df!("v" => &[None, Some(1.0), None, Some(3.0), None]).unwrap();

        let filled = imputer
            .impute(&mut df, "v", &ImputationStrategy::ForwardFill)
            .unwrap();

        assert_eq!(filled, 2);
        assert_eq!(df.column("v").unwrap().null_count(), 1);
        assert_eq!(
            reporter.events(),
            vec![CleaningEvent::ValuesImputed {
                column: "v".to_string(),
                strategy: "forward_fill".to_string(),
                filled: 2,
            }]
        );
    }

    #[test]
    fn test_mean_on_all_null_column_fills_nothing() {
        let series = Series::new("v".into(), &[None::<f64>, None, None]);
        let imputed = MissingValueImputer::new()
            .impute_series(&series, &ImputationStrategy::Mean)
            .unwrap();
        assert_eq!(imputed.filled, 0);
        assert_eq!(imputed.series.null_count(), 3);
    }

    #[test]
    fn test_impute_unknown_column() {
        let mut df = df!("v" => &[1]).unwrap();
        let err = MissingValueImputer::new()
            .impute(&mut df, "missing", &ImputationStrategy::Median)
            .unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_median_produces_float() {
        let mut df = df!("v" => &[Some(1i64), None, Some(3)]).unwrap();
        let filled = MissingValueImputer::new()
            .impute(&mut df, "v", &ImputationStrategy::Median)
            .unwrap();
        assert_eq!(filled, 1);

        let values: Vec<Option<f64>> = df.column("v").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }
}
