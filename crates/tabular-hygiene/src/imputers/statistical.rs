//! Statistical imputation methods.
//!
//! Provides mean, median and mode substitution.

use polars::prelude::*;

use super::fill::broadcast_into_nulls;
use crate::error::{CleaningError, Result};
use crate::utils::{is_numeric_dtype, mode_index};

/// Fill nulls with the mean of present values. The result is `Float64`.
///
/// An entirely-null column has no mean and is returned unchanged.
pub(crate) fn mean_fill(series: &Series) -> Result<Series> {
    require_numeric(series, "mean")?;
    match series.mean() {
        Some(mean) => fill_numeric_nulls(series, mean),
        None => Ok(series.clone()),
    }
}

/// Fill nulls with the median of present values. The result is `Float64`.
///
/// An entirely-null column has no median and is returned unchanged.
pub(crate) fn median_fill(series: &Series) -> Result<Series> {
    require_numeric(series, "median")?;
    match series.median() {
        Some(median) => fill_numeric_nulls(series, median),
        None => Ok(series.clone()),
    }
}

/// Fill nulls with the most frequent present value, keeping the dtype.
///
/// Ties go to the value seen first.
pub(crate) fn mode_fill(series: &Series) -> Result<Series> {
    let index = mode_index(series)?.ok_or_else(|| CleaningError::Imputation {
        column: series.name().to_string(),
        reason: "mode is undefined for a column without present values".to_string(),
    })?;
    broadcast_into_nulls(series, series, index)
}

pub(crate) fn require_numeric(series: &Series, strategy: &str) -> Result<()> {
    if is_numeric_dtype(series.dtype()) {
        Ok(())
    } else {
        Err(CleaningError::Imputation {
            column: series.name().to_string(),
            reason: format!("{strategy} requires a numeric column, found {}", series.dtype()),
        })
    }
}

fn fill_numeric_nulls(series: &Series, fill_value: f64) -> Result<Series> {
    let values: Vec<Option<f64>> = series
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}
