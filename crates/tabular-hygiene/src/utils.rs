//! Shared utilities for the cleaning components.
//!
//! Column lookup, dtype classification and a few small statistics helpers
//! used by more than one module.

use std::collections::HashMap;

use polars::prelude::*;

use crate::error::{CleaningError, Result};

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for cleaning purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer types
    Integer,
    /// Floating point types
    Float,
    /// Date or datetime types
    Datetime,
    /// Boolean type
    Boolean,
    /// String/categorical type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_integer_dtype(dtype) {
        DtypeCategory::Integer
    } else if is_numeric_dtype(dtype) {
        DtypeCategory::Float
    } else if is_datetime_dtype(dtype) {
        DtypeCategory::Datetime
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

// =============================================================================
// Column Access
// =============================================================================

/// Look up a column by name, failing with [`CleaningError::ColumnNotFound`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|column| column.as_materialized_series())
        .map_err(|_| CleaningError::ColumnNotFound(name.to_string()))
}

/// Check that every name exists before anything is touched.
pub fn require_columns<S: AsRef<str>>(df: &DataFrame, names: &[S]) -> Result<()> {
    for name in names {
        require_column(df, name.as_ref())?;
    }
    Ok(())
}

/// Column names of a dataset as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Fetch a numeric column as `Float64`, failing with `NotNumeric` otherwise.
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Series> {
    let series = require_column(df, name)?;
    if !is_numeric_dtype(series.dtype()) {
        return Err(CleaningError::NotNumeric {
            column: name.to_string(),
            dtype: series.dtype().to_string(),
        });
    }
    Ok(series.cast(&DataType::Float64)?)
}

// =============================================================================
// Statistics Utilities
// =============================================================================

/// Present, non-NaN values of a `Float64` series, sorted ascending.
pub fn sorted_present_values(series: &Series) -> Result<Vec<f64>> {
    let mut values: Vec<f64> = series
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect();
    values.sort_by(f64::total_cmp);
    Ok(values)
}

/// Position of the most frequent present value.
///
/// Values are compared through their string rendering so that any dtype
/// can be counted. Ties go to the value that appears first.
pub fn mode_index(series: &Series) -> Result<Option<usize>> {
    let rendered = series.cast(&DataType::String)?;
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (idx, value) in rendered.str()?.into_iter().enumerate() {
        if let Some(value) = value {
            counts.entry(value).or_insert((0, idx)).0 += 1;
        }
    }

    Ok(counts
        .into_values()
        .max_by(|(count_a, first_a), (count_b, first_b)| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(_, first)| first))
}

/// Round a percentage to two decimals.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole * 100`, or 0 when `whole` is 0.
#[inline]
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_dtype_category() {
        assert_eq!(get_dtype_category(&DataType::Int32), DtypeCategory::Integer);
        assert_eq!(get_dtype_category(&DataType::Float64), DtypeCategory::Float);
        assert_eq!(get_dtype_category(&DataType::Date), DtypeCategory::Datetime);
        assert_eq!(
            get_dtype_category(&DataType::Boolean),
            DtypeCategory::Boolean
        );
        assert_eq!(get_dtype_category(&DataType::String), DtypeCategory::String);
    }

    #[test]
    fn test_require_column_reports_name() {
        let df = df!("A" => &[1, 2]).unwrap();
        assert!(require_column(&df, "A").is_ok());

        let err = require_column(&df, "B").unwrap_err();
        assert!(matches!(err, CleaningError::ColumnNotFound(ref name) if name == "B"));
    }

    #[test]
    fn test_numeric_column_rejects_text() {
        let df = df!("Name" => &["a", "b"]).unwrap();
        let err = numeric_column(&df, "Name").unwrap_err();
        assert_eq!(err.error_code(), "NOT_NUMERIC");
    }

    #[test]
    fn test_sorted_present_values_skips_nulls_and_nan() {
        let series = Series::new("v".into(), &[Some(3.0), None, Some(f64::NAN), Some(1.0)]);
        assert_eq!(sorted_present_values(&series).unwrap(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_mode_index_prefers_first_appearance_on_tie() {
        let series = Series::new("v".into(), &[Some("b"), Some("a"), None, Some("a"), Some("b")]);
        assert_eq!(mode_index(&series).unwrap(), Some(0));

        let series = Series::new("v".into(), &[Some(1), Some(2), Some(2)]);
        assert_eq!(mode_index(&series).unwrap(), Some(1));
    }

    #[test]
    fn test_mode_index_all_null() {
        let series = Series::new("v".into(), &[None::<i64>, None]);
        assert_eq!(mode_index(&series).unwrap(), None);
    }

    #[test]
    fn test_percentage_helpers() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(1, 0), 0.0);
    }
}
