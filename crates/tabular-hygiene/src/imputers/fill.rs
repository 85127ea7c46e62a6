//! Positional and constant fills.

use polars::prelude::*;

use crate::config::FillValue;
use crate::error::{CleaningError, Result};
use crate::utils::{DtypeCategory, get_dtype_category};

/// Propagate the nearest preceding present value. Leading nulls stay null.
pub(crate) fn forward_fill(series: &Series) -> Result<Series> {
    Ok(series.fill_null(FillNullStrategy::Forward(None))?)
}

/// Propagate the nearest following present value. Trailing nulls stay null.
pub(crate) fn backward_fill(series: &Series) -> Result<Series> {
    Ok(series.fill_null(FillNullStrategy::Backward(None))?)
}

/// Fill nulls with a caller value of the column's type.
///
/// Text goes to string columns, integers to integer columns, integers or
/// floats to float columns and booleans to boolean columns. The column
/// keeps its dtype.
pub(crate) fn constant_fill(series: &Series, value: &FillValue) -> Result<Series> {
    let fill = constant_for(series, value)?;
    broadcast_into_nulls(series, &fill, 0)
}

/// `value` as a one-element series of the column's dtype.
pub(crate) fn constant_for(series: &Series, value: &FillValue) -> Result<Series> {
    let name = series.name().clone();
    let dtype = series.dtype();

    let fill = match (get_dtype_category(dtype), value) {
        (DtypeCategory::String, FillValue::Text(text)) => Series::new(name, [text.as_str()]),
        (DtypeCategory::Integer, FillValue::Int(v)) => Series::new(name, [*v]),
        (DtypeCategory::Float, FillValue::Int(v)) => Series::new(name, [*v as f64]),
        (DtypeCategory::Float, FillValue::Float(v)) => Series::new(name, [*v]),
        (DtypeCategory::Boolean, FillValue::Bool(v)) => Series::new(name, [*v]),
        _ => {
            return Err(CleaningError::Imputation {
                column: series.name().to_string(),
                reason: format!("constant {value} does not match column type {dtype}"),
            });
        }
    };

    fill.strict_cast(dtype)
        .map_err(|_| CleaningError::Imputation {
            column: series.name().to_string(),
            reason: format!("constant {value} does not fit column type {dtype}"),
        })
}

/// Replace nulls with the value at `index` of `source`.
pub(crate) fn broadcast_into_nulls(series: &Series, source: &Series, index: usize) -> Result<Series> {
    let fill = source.new_from_index(index, series.len());
    Ok(series.zip_with(&series.is_not_null(), &fill)?)
}
