//! Value-level conversion functions used by the type coercer.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

use crate::config::{DateFallback, DateParsePolicy};

/// Day-first formats with a date and a time component.
const FALLBACK_DATETIME_FORMATS: [&str; 12] = [
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Day-first date-only formats. Two-digit years come first since `%Y`
/// would otherwise read "24" as the year 24.
const FALLBACK_DATE_FORMATS: [&str; 12] = [
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
];

/// Result of parsing a column of date-like text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedDates {
    /// Milliseconds since the epoch, null where the value did not parse
    pub millis: Vec<Option<i64>>,
    /// Present values that became null
    pub nulled: usize,
    /// Whether the permissive parser was needed
    pub used_fallback: bool,
}

/// Parse a single value with one explicit format, date-time or date-only.
pub(crate) fn parse_with_format(value: &str, format: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Permissive day-before-month parse over the known format families.
pub(crate) fn parse_day_first(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            FALLBACK_DATE_FORMATS.iter().find_map(|format| {
                NaiveDate::parse_from_str(value, format)
                    .ok()
                    .map(|date| date.and_time(NaiveTime::MIN))
            })
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

#[inline]
pub(crate) fn to_millis(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp_millis()
}

/// Convert epoch milliseconds back to a calendar day.
pub(crate) fn millis_to_date(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

/// Two-tier parse of a string column.
///
/// Every present value is first parsed with the policy's strict format. If
/// all of them match, that result is used. Otherwise the whole column is
/// re-parsed with the day-first parser (when enabled), and values that still
/// fail become null.
pub(crate) fn parse_date_strings(values: &StringChunked, policy: &DateParsePolicy) -> ParsedDates {
    let strict: Vec<Option<Option<i64>>> = values
        .into_iter()
        .map(|value| value.map(|v| parse_with_format(v, &policy.format).map(to_millis)))
        .collect();

    let strict_failures = strict
        .iter()
        .filter(|value| matches!(value, Some(None)))
        .count();

    if strict_failures == 0 {
        return ParsedDates {
            millis: strict.into_iter().map(Option::flatten).collect(),
            nulled: 0,
            used_fallback: false,
        };
    }

    match policy.fallback {
        DateFallback::Disabled => ParsedDates {
            millis: strict.into_iter().map(Option::flatten).collect(),
            nulled: strict_failures,
            used_fallback: false,
        },
        DateFallback::DayFirst => {
            let mut nulled = 0;
            let millis = values
                .into_iter()
                .map(|value| {
                    let value = value?;
                    let parsed = parse_with_format(value, &policy.format)
                        .or_else(|| parse_day_first(value))
                        .map(to_millis);
                    if parsed.is_none() {
                        nulled += 1;
                    }
                    parsed
                })
                .collect();

            ParsedDates {
                millis,
                nulled,
                used_fallback: true,
            }
        }
    }
}

/// Strict integer parse: integral floats such as "3.0" are accepted.
pub(crate) fn parse_integer(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }
    let float = trimmed.parse::<f64>().ok()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

/// Strict float parse of trimmed text.
pub(crate) fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// Convert every present value, stopping at the first failure.
///
/// Returns the converted values or the first offending input.
pub(crate) fn convert_strict<T>(
    values: &StringChunked,
    parse: impl Fn(&str) -> Option<T>,
) -> std::result::Result<Vec<Option<T>>, String> {
    values
        .into_iter()
        .map(|value| match value {
            None => Ok(None),
            Some(v) => parse(v).map(Some).ok_or_else(|| v.to_string()),
        })
        .collect()
}

/// Convert every present value, turning failures into nulls.
///
/// Returns the converted values and how many present values became null.
pub(crate) fn convert_lenient<T>(
    values: &StringChunked,
    parse: impl Fn(&str) -> Option<T>,
) -> (Vec<Option<T>>, usize) {
    let mut nulled = 0;
    let converted = values
        .into_iter()
        .map(|value| {
            let value = value?;
            let parsed = parse(value);
            if parsed.is_none() {
                nulled += 1;
            }
            parsed
        })
        .collect();
    (converted, nulled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_parse_with_format_day_month_year() {
        assert_eq!(parse_with_format("03/04/2024", "%d/%m/%Y"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_with_format(" 31/12/2023 ", "%d/%m/%Y"), Some(ymd(2023, 12, 31)));
        assert_eq!(parse_with_format("2024-04-03", "%d/%m/%Y"), None);
        assert_eq!(parse_with_format("31/02/2024", "%d/%m/%Y"), None);
    }

    #[test]
    fn test_parse_day_first_mixed_formats() {
        assert_eq!(parse_day_first("2024-04-03"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_day_first("03-04-2024"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_day_first("03/04/24"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_day_first("03.04.2024"), Some(ymd(2024, 4, 3)));
        assert_eq!(
            parse_day_first("2024-04-03 10:30:00"),
            NaiveDate::from_ymd_opt(2024, 4, 3).unwrap().and_hms_opt(10, 30, 0)
        );
        assert_eq!(parse_day_first("not a date"), None);
        assert_eq!(parse_day_first(""), None);
    }

    #[test]
    fn test_parse_date_strings_strict_success() {
        let values = StringChunked::new("D".into(), &[Some("01/02/2024"), None, Some("02/02/2024")]);
        let parsed = parse_date_strings(&values, &DateParsePolicy::default());

        assert!(!parsed.used_fallback);
        assert_eq!(parsed.nulled, 0);
        assert_eq!(parsed.millis[0], Some(to_millis(ymd(2024, 2, 1))));
        assert_eq!(parsed.millis[1], None);
    }

    #[test]
    fn test_parse_date_strings_fallback() {
        let values = StringChunked::new("D".into(), &["01/02/2024", "2024-02-05", "garbage"]);
        let parsed = parse_date_strings(&values, &DateParsePolicy::default());

        assert!(parsed.used_fallback);
        assert_eq!(parsed.nulled, 1);
        assert_eq!(parsed.millis[0], Some(to_millis(ymd(2024, 2, 1))));
        assert_eq!(parsed.millis[1], Some(to_millis(ymd(2024, 2, 5))));
        assert_eq!(parsed.millis[2], None);
    }

    #[test]
    fn test_parse_date_strings_fallback_disabled() {
        let values = StringChunked::new("D".into(), &["01/02/2024", "2024-02-05"]);
        let policy = DateParsePolicy {
            fallback: DateFallback::Disabled,
            ..DateParsePolicy::default()
        };
        let parsed = parse_date_strings(&values, &policy);

        assert_eq!(parsed.nulled, 1);
        assert_eq!(parsed.millis[1], None);
    }

    #[test]
    fn test_millis_round_trip_to_date() {
        let millis = to_millis(ymd(2023, 7, 15));
        assert_eq!(millis_to_date(millis), NaiveDate::from_ymd_opt(2023, 7, 15));
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer(" -7 "), Some(-7));
        assert_eq!(parse_integer("3.0"), Some(3));
        assert_eq!(parse_integer("3.5"), None);
        assert_eq!(parse_integer("abc"), None);
    }

    #[test]
    fn test_convert_strict_names_first_offender() {
        let values = StringChunked::new("Q".into(), &[Some("1"), None, Some("x"), Some("y")]);
        assert_eq!(convert_strict(&values, parse_integer), Err("x".to_string()));

        let values = StringChunked::new("Q".into(), &[Some("1"), None]);
        assert_eq!(convert_strict(&values, parse_integer), Ok(vec![Some(1), None]));
    }

    #[test]
    fn test_convert_lenient_counts_nulled() {
        let values = StringChunked::new("Q".into(), &[Some("1"), None, Some("2.5"), Some("z")]);
        let (converted, nulled) = convert_lenient(&values, parse_integer);
        assert_eq!(converted, vec![Some(1), None, None, None]);
        assert_eq!(nulled, 2);
    }
}
