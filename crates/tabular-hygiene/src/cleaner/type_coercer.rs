//! Column-wise type coercion.

use std::sync::Arc;

use polars::prelude::*;
use tracing::debug;

use super::converters::{
    convert_lenient, convert_strict, parse_date_strings, parse_float, parse_integer,
};
use crate::config::{CleaningConfig, DateParsePolicy};
use crate::error::{CleaningError, Result};
use crate::events::{CleaningEvent, EventReporter, default_reporter};
use crate::utils::{is_integer_dtype, is_numeric_dtype, require_column, require_columns};

/// Normalizes the type of named columns in place.
///
/// Every operation checks all requested columns exist before converting
/// any of them, and replaces the columns only once every conversion
/// succeeded. A failed strict conversion leaves the dataset untouched.
///
/// # Example
///
/// ```rust,ignore
/// use tabular_hygiene::cleaner::TypeCoercer;
///
/// let coercer = TypeCoercer::new();
/// coercer.to_nullable_integer(&mut df, &["QUANTITY"])?;
/// coercer.to_datetime(&mut df, &["ISSUE_DATE"])?;
/// ```
pub struct TypeCoercer {
    policy: DateParsePolicy,
    reporter: Arc<dyn EventReporter>,
}

impl Default for TypeCoercer {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCoercer {
    /// Coercer with the default `%d/%m/%Y` date policy and tracing reporter.
    pub fn new() -> Self {
        Self {
            policy: DateParsePolicy::default(),
            reporter: default_reporter(),
        }
    }

    pub fn from_config(config: &CleaningConfig) -> Self {
        Self::new().with_date_policy(config.date_policy())
    }

    pub fn with_date_policy(mut self, policy: DateParsePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn EventReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn date_policy(&self) -> &DateParsePolicy {
        &self.policy
    }

    /// Convert columns to text.
    pub fn to_string<S: AsRef<str>>(&self, df: &mut DataFrame, columns: &[S]) -> Result<()> {
        self.apply(df, columns, "String", |name, series| {
            let converted = series
                .cast(&DataType::String)
                .map_err(|_| dtype_failure(name, series, "String"))?;
            Ok((converted, 0))
        })
    }

    /// Convert columns to `Int64`, failing on the first value that is not an integer.
    ///
    /// Nulls stay null.
    pub fn to_integer<S: AsRef<str>>(&self, df: &mut DataFrame, columns: &[S]) -> Result<()> {
        self.apply(df, columns, "Int64", |name, series| {
            if is_integer_dtype(series.dtype()) || series.dtype() == &DataType::Boolean {
                let converted = series
                    .strict_cast(&DataType::Int64)
                    .map_err(|_| dtype_failure(name, series, "Int64"))?;
                return Ok((converted, 0));
            }

            let text = series.cast(&DataType::String)?;
            let values = convert_strict(text.str()?, parse_integer).map_err(|value| {
                CleaningError::TypeCoercion {
                    column: name.to_string(),
                    value,
                    target: "Int64".to_string(),
                }
            })?;
            Ok((Series::new(series.name().clone(), values), 0))
        })
    }

    /// Convert columns to nullable `Int64`. Unparsable or non-integral values
    /// become null; this never fails on content.
    pub fn to_nullable_integer<S: AsRef<str>>(
        &self,
        df: &mut DataFrame,
        columns: &[S],
    ) -> Result<()> {
        self.apply(df, columns, "Int64 (nullable)", |_, series| {
            if is_integer_dtype(series.dtype()) || series.dtype() == &DataType::Boolean {
                return Ok((series.cast(&DataType::Int64)?, 0));
            }

            let text = series.cast(&DataType::String)?;
            let (values, nulled) = convert_lenient(text.str()?, parse_integer);
            Ok((Series::new(series.name().clone(), values), nulled))
        })
    }

    /// Convert columns to `Float64`, failing on the first unparsable value.
    pub fn to_float<S: AsRef<str>>(&self, df: &mut DataFrame, columns: &[S]) -> Result<()> {
        self.apply(df, columns, "Float64", |name, series| {
            if is_numeric_dtype(series.dtype()) || series.dtype() == &DataType::Boolean {
                return Ok((series.cast(&DataType::Float64)?, 0));
            }

            let text = series.cast(&DataType::String)?;
            let values = convert_strict(text.str()?, parse_float).map_err(|value| {
                CleaningError::TypeCoercion {
                    column: name.to_string(),
                    value,
                    target: "Float64".to_string(),
                }
            })?;
            Ok((Series::new(series.name().clone(), values), 0))
        })
    }

    /// Convert columns to `Datetime(ms)` with the two-tier date policy.
    ///
    /// Never fails on content: values neither the strict format nor the
    /// fallback parser understand become null.
    pub fn to_datetime<S: AsRef<str>>(&self, df: &mut DataFrame, columns: &[S]) -> Result<()> {
        self.apply(df, columns, "Datetime", |_, series| {
            coerce_datetime(series, &self.policy)
        })
    }

    /// Multiply numeric columns by `factor`. The result is `Float64`.
    pub fn multiply_by_factor<S: AsRef<str>>(
        &self,
        df: &mut DataFrame,
        columns: &[S],
        factor: f64,
    ) -> Result<()> {
        self.apply(df, columns, "Float64", |name, series| {
            if !is_numeric_dtype(series.dtype()) {
                return Err(dtype_failure(name, series, "Float64"));
            }
            let values: Vec<Option<f64>> = series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.map(|v| v * factor))
                .collect();
            Ok((Series::new(series.name().clone(), values), 0))
        })
    }

    /// Validate, convert every column, then swap them in.
    fn apply<S, F>(&self, df: &mut DataFrame, columns: &[S], target: &str, convert: F) -> Result<()>
    where
        S: AsRef<str>,
        F: Fn(&str, &Series) -> Result<(Series, usize)>,
    {
        require_columns(df, columns)?;

        let mut converted = Vec::with_capacity(columns.len());
        let mut nulled = 0;
        for name in columns {
            let name = name.as_ref();
            let series = require_column(df, name)?;
            let (series, column_nulled) = convert(name, series)?;
            debug!(column = name, to = target, nulled = column_nulled, "Converted column");
            nulled += column_nulled;
            converted.push((name.to_string(), series));
        }

        for (name, series) in converted {
            df.replace(&name, series)?;
        }

        self.reporter.report(CleaningEvent::ColumnsCoerced {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            target: target.to_string(),
            nulled,
        });
        Ok(())
    }
}

/// Normalize one column to `Datetime(ms)`.
///
/// Returns the converted column and how many present values became null.
pub(crate) fn coerce_datetime(series: &Series, policy: &DateParsePolicy) -> Result<(Series, usize)> {
    match series.dtype() {
        DataType::Datetime(_, tz) => Ok((
            series.cast(&DataType::Datetime(TimeUnit::Milliseconds, tz.clone()))?,
            0,
        )),
        DataType::Date => Ok((
            series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
            0,
        )),
        _ => {
            let text = series.cast(&DataType::String)?;
            let parsed = parse_date_strings(text.str()?, policy);
            if parsed.used_fallback {
                debug!(
                    column = %series.name(),
                    format = %policy.format,
                    "Strict date format did not match every value, used day-first fallback"
                );
            }
            let millis = Series::new(series.name().clone(), parsed.millis);
            Ok((
                millis.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
                parsed.nulled,
            ))
        }
    }
}

fn dtype_failure(column: &str, series: &Series, target: &str) -> CleaningError {
    CleaningError::TypeCoercion {
        column: column.to_string(),
        value: format!("<{}>", series.dtype()),
        target: target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DateFallback;
    use crate::events::CollectingEventReporter;
    use pretty_assertions::assert_eq;

    fn collecting() -> (TypeCoercer, Arc<CollectingEventReporter>) {
        let reporter = Arc::new(CollectingEventReporter::new());
        (TypeCoercer::new().with_reporter(reporter.clone()), reporter)
    }

    #[test]
    fn test_to_integer_parses_text() {
        let mut df = df!("QTY" => &[Some("1"), None, Some(" 3 ")]).unwrap();
        TypeCoercer::new().to_integer(&mut df, &["QTY"]).unwrap();

        let qty = df.column("QTY").unwrap();
        assert_eq!(qty.dtype(), &DataType::Int64);
        let values: Vec<Option<i64>> = qty.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1), None, Some(3)]);
    }

    #[test]
    fn test_to_integer_names_offending_value() {
        let mut df = df!("QTY" => &["1", "two", "3"]).unwrap();
        let err = TypeCoercer::new().to_integer(&mut df, &["QTY"]).unwrap_err();

        match err {
            CleaningError::TypeCoercion { column, value, .. } => {
                assert_eq!(column, "QTY");
                assert_eq!(value, "two");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Untouched on failure
        assert_eq!(df.column("QTY").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_to_integer_rejects_fractional_floats() {
        let mut df = df!("V" => &[1.0, 2.5]).unwrap();
        let err = TypeCoercer::new().to_integer(&mut df, &["V"]).unwrap_err();
        assert_eq!(err.error_code(), "TYPE_COERCION_FAILED");
    }

    #[test]
    fn test_to_nullable_integer_downgrades_bad_values() {
        let mut df = df!("QTY" => &["10", "x", "2.5", "4.0"]).unwrap();
        let (coercer, reporter) = collecting();
        coercer.to_nullable_integer(&mut df, &["QTY"]).unwrap();

        let values: Vec<Option<i64>> = df.column("QTY").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(10), None, None, Some(4)]);

        let events = reporter.events();
        assert_eq!(
            events,
            vec![CleaningEvent::ColumnsCoerced {
                columns: vec!["QTY".to_string()],
                target: "Int64 (nullable)".to_string(),
                nulled: 2,
            }]
        );
    }

    #[test]
    fn test_to_float_and_string() {
        let mut df = df!("P" => &["1.5", "2"], "N" => &[1i64, 2]).unwrap();
        let coercer = TypeCoercer::new();
        coercer.to_float(&mut df, &["P"]).unwrap();
        coercer.to_string(&mut df, &["N"]).unwrap();

        assert_eq!(df.column("P").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("N").unwrap().dtype(), &DataType::String);
        let n: Vec<Option<&str>> = df.column("N").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(n, vec![Some("1"), Some("2")]);
    }

    #[test]
    fn test_unknown_column_fails_before_touching_anything() {
        let mut df = df!("A" => &["1"], "B" => &["2"]).unwrap();
        let err = TypeCoercer::new()
            .to_integer(&mut df, &["A", "MISSING"])
            .unwrap_err();

        assert!(matches!(err, CleaningError::ColumnNotFound(ref c) if c == "MISSING"));
        assert_eq!(df.column("A").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_to_datetime_strict_format() {
        let mut df = df!("D" => &["01/02/2024", "15/03/2024"]).unwrap();
        TypeCoercer::new().to_datetime(&mut df, &["D"]).unwrap();

        let column = df.column("D").unwrap();
        assert_eq!(
            column.dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
        assert_eq!(column.null_count(), 0);
    }

    #[test]
    fn test_to_datetime_fallback_nulls_garbage() {
        let mut df = df!("D" => &["01/02/2024", "2024-03-15", "???"]).unwrap();
        let (coercer, reporter) = collecting();
        coercer.to_datetime(&mut df, &["D"]).unwrap();

        assert_eq!(df.column("D").unwrap().null_count(), 1);
        assert!(reporter.events()[0].is_warning());
    }

    #[test]
    fn test_to_datetime_without_fallback() {
        let mut df = df!("D" => &["01/02/2024", "2024-03-15"]).unwrap();
        let coercer = TypeCoercer::new().with_date_policy(DateParsePolicy {
            fallback: DateFallback::Disabled,
            ..DateParsePolicy::default()
        });
        coercer.to_datetime(&mut df, &["D"]).unwrap();

        assert_eq!(df.column("D").unwrap().null_count(), 1);
    }

    #[test]
    fn test_multiply_by_factor() {
        let mut df = df!("PRICE" => &[Some(1i64), None, Some(3)]).unwrap();
        TypeCoercer::new()
            .multiply_by_factor(&mut df, &["PRICE"], 2.5)
            .unwrap();

        let values: Vec<Option<f64>> = df.column("PRICE").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(2.5), None, Some(7.5)]);
    }

    #[test]
    fn test_multiply_by_factor_rejects_text() {
        let mut df = df!("NAME" => &["a"]).unwrap();
        let err = TypeCoercer::new()
            .multiply_by_factor(&mut df, &["NAME"], 2.0)
            .unwrap_err();
        assert_eq!(err.error_code(), "TYPE_COERCION_FAILED");
    }
}
