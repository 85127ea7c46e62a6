//! Dense daily grids for sparse time series.
//!
//! A series recorded only on days with activity hides its gaps. Crossing
//! every calendar day between the first and last observation with every
//! category exposes them, ready for a left join of the observed data.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use polars::prelude::*;

use crate::cleaner::{coerce_datetime, millis_to_date};
use crate::config::{CleaningConfig, DateParsePolicy};
use crate::error::{CleaningError, Result};
use crate::events::{CleaningEvent, EventReporter, default_reporter};
use crate::utils::require_column;

/// Name of the date column of a built grid.
pub const GRID_DATE_COLUMN: &str = "DATE";

/// Builds date axes and date × category grids.
pub struct TemporalGridBuilder {
    policy: DateParsePolicy,
    reporter: Arc<dyn EventReporter>,
}

impl Default for TemporalGridBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TemporalGridBuilder {
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

    /// Every calendar day from the earliest to the latest date of `date_column`.
    ///
    /// Text columns are parsed with the builder's date policy; the dataset
    /// itself is not modified. Fails with [`CleaningError::NoValidValues`]
    /// when no value is a valid date.
    pub fn build_date_axis(&self, df: &DataFrame, date_column: &str) -> Result<Vec<NaiveDate>> {
        let series = require_column(df, date_column)?;
        let (dates, _) = coerce_datetime(series, &self.policy)?;
        let millis = dates.cast(&DataType::Int64)?;

        let (start, end) = millis
            .i64()?
            .into_iter()
            .flatten()
            .filter_map(millis_to_date)
            .fold(None, |range: Option<(NaiveDate, NaiveDate)>, day| match range {
                None => Some((day, day)),
                Some((start, end)) => Some((start.min(day), end.max(day))),
            })
            .ok_or_else(|| CleaningError::NoValidValues(date_column.to_string()))?;

        let axis: Vec<NaiveDate> = start.iter_days().take_while(|day| *day <= end).collect();

        self.reporter.report(CleaningEvent::DateAxisBuilt {
            column: date_column.to_string(),
            start: start.format("%d/%m/%Y").to_string(),
            end: end.format("%d/%m/%Y").to_string(),
            days: axis.len(),
        });
        Ok(axis)
    }

    /// Cross `dates` with the distinct non-null values of `category_column`.
    ///
    /// The grid has a [`GRID_DATE_COLUMN`] column (`Datetime(ms)` at
    /// midnight) and the category column with its original type. Rows are
    /// date-major; categories follow their first appearance in `df`.
    ///
    /// A category column named [`GRID_DATE_COLUMN`] would collide with the
    /// date column and is rejected with [`CleaningError::InvalidConfig`].
    pub fn build_grid(
        &self,
        dates: &[NaiveDate],
        df: &DataFrame,
        category_column: &str,
    ) -> Result<DataFrame> {
        if category_column == GRID_DATE_COLUMN {
            return Err(CleaningError::InvalidConfig(format!(
                "category column cannot be named '{GRID_DATE_COLUMN}', the grid's date column"
            )));
        }
        let series = require_column(df, category_column)?;
        let categories = series.take(&first_appearances(series)?)?;
        let n_categories = categories.len();

        let mut millis = Vec::with_capacity(dates.len() * n_categories);
        let mut category_idx: Vec<IdxSize> = Vec::with_capacity(dates.len() * n_categories);
        for date in dates {
            let midnight = date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis();
            for idx in 0..n_categories {
                millis.push(midnight);
                category_idx.push(idx as IdxSize);
            }
        }

        let date_series = Series::new(GRID_DATE_COLUMN.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        let category_series =
            categories.take(&IdxCa::from_vec(category_column.into(), category_idx))?;
        let grid = DataFrame::new(vec![date_series.into(), category_series.into()])?;

        self.reporter.report(CleaningEvent::GridBuilt {
            category_column: category_column.to_string(),
            dates: dates.len(),
            categories: n_categories,
            rows: grid.height(),
        });
        Ok(grid)
    }
}

/// Positions of the first occurrence of each distinct non-null value.
fn first_appearances(series: &Series) -> Result<IdxCa> {
    let rendered = series.cast(&DataType::String)?;
    let mut seen = HashSet::new();
    let positions: Vec<IdxSize> = rendered
        .str()?
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match value {
            Some(value) if seen.insert(value) => Some(idx as IdxSize),
            _ => None,
        })
        .collect();
    Ok(IdxCa::from_vec(series.name().clone(), positions))
}
