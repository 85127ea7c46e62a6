//! Diagnostic events emitted by the cleaning components.
//!
//! Components never print. Every observable side effect (values filled,
//! rows removed, a join that could not be performed) is described by a
//! [`CleaningEvent`] and handed to an [`EventReporter`]. Reporting never
//! alters control flow.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tabular_hygiene::events::{ClosureEventReporter, CleaningEvent};
//! use tabular_hygiene::OutlierEngine;
//!
//! let reporter = Arc::new(ClosureEventReporter::new(|event: CleaningEvent| {
//!     println!("{}", event.kind());
//! }));
//! let engine = OutlierEngine::with_reporter(reporter);
//! ```

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::JoinKind;

/// A single diagnostic emitted by a cleaning operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CleaningEvent {
    /// Columns were converted to a new type.
    ColumnsCoerced {
        columns: Vec<String>,
        target: String,
        /// Present values that could not be converted and became null
        nulled: usize,
    },
    /// Missing values were filled in one column.
    ValuesImputed {
        column: String,
        strategy: String,
        filled: usize,
    },
    /// Rows holding out-of-fence values were dropped.
    OutliersRemoved {
        columns: Vec<String>,
        rows_before: usize,
        rows_after: usize,
    },
    /// Out-of-fence values were replaced by the nearest bound.
    OutliersClipped {
        columns: Vec<String>,
        values_clipped: usize,
    },
    /// A missingness diagnostic was computed.
    MissingnessMeasured {
        /// Which diagnostic produced the value
        measure: String,
        /// Percentage for rates, flagged column count for reports
        value: f64,
    },
    /// Auxiliary columns were joined onto the primary dataset.
    DatasetsReconciled {
        keys: Vec<String>,
        join: JoinKind,
        rows_before: usize,
        rows_after: usize,
    },
    /// A reconciliation could not be performed.
    ReconciliationFailed {
        keys: Vec<String>,
        primary_columns: Vec<String>,
        auxiliary_columns: Vec<String>,
        reason: String,
    },
    /// A contiguous daily axis was derived from a date column.
    DateAxisBuilt {
        column: String,
        start: String,
        end: String,
        days: usize,
    },
    /// A date × category grid was materialized.
    GridBuilt {
        category_column: String,
        dates: usize,
        categories: usize,
        rows: usize,
    },
    /// Rows were removed by a sanitizing operation.
    RowsDropped { reason: String, rows: usize },
    /// Columns were removed from the dataset.
    ColumnsDropped { columns: Vec<String> },
    /// A key column was trimmed and truncated.
    KeyStandardized {
        column: String,
        max_chars: usize,
        rows_dropped: usize,
    },
    /// Rows were reordered by a date column.
    RowsSorted { column: String, ascending: bool },
}

impl CleaningEvent {
    /// Stable snake_case identifier of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ColumnsCoerced { .. } => "columns_coerced",
            Self::ValuesImputed { .. } => "values_imputed",
            Self::OutliersRemoved { .. } => "outliers_removed",
            Self::OutliersClipped { .. } => "outliers_clipped",
            Self::MissingnessMeasured { .. } => "missingness_measured",
            Self::DatasetsReconciled { .. } => "datasets_reconciled",
            Self::ReconciliationFailed { .. } => "reconciliation_failed",
            Self::DateAxisBuilt { .. } => "date_axis_built",
            Self::GridBuilt { .. } => "grid_built",
            Self::RowsDropped { .. } => "rows_dropped",
            Self::ColumnsDropped { .. } => "columns_dropped",
            Self::KeyStandardized { .. } => "key_standardized",
            Self::RowsSorted { .. } => "rows_sorted",
        }
    }

    /// Whether the event describes a degraded outcome the caller should see.
    pub fn is_warning(&self) -> bool {
        match self {
            Self::ReconciliationFailed { .. } => true,
            Self::ColumnsCoerced { nulled, .. } => *nulled > 0,
            _ => false,
        }
    }
}

/// Trait for receiving diagnostics from the cleaning components.
///
/// Implementations must be `Send + Sync` so that components holding a
/// reporter can be moved to a worker thread.
pub trait EventReporter: Send + Sync {
    /// Called once per diagnostic. Implementations should not block.
    fn report(&self, event: CleaningEvent);
}

/// Default reporter: writes every event as structured `tracing` fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventReporter;

impl EventReporter for TracingEventReporter {
    fn report(&self, event: CleaningEvent) {
        match &event {
            CleaningEvent::ColumnsCoerced {
                columns,
                target,
                nulled,
            } => {
                if *nulled > 0 {
                    warn!(?columns, to = %target, nulled, "Coerced columns, unparsable values set to null");
                } else {
                    info!(?columns, to = %target, "Coerced columns");
                }
            }
            CleaningEvent::ValuesImputed {
                column,
                strategy,
                filled,
            } => info!(%column, %strategy, filled, "Imputed missing values"),
            CleaningEvent::OutliersRemoved {
                columns,
                rows_before,
                rows_after,
            } => info!(
                ?columns,
                rows_before,
                rows_after,
                removed = rows_before.saturating_sub(*rows_after),
                "Removed outlier rows"
            ),
            CleaningEvent::OutliersClipped {
                columns,
                values_clipped,
            } => info!(?columns, values_clipped, "Clipped outliers to IQR bounds"),
            CleaningEvent::MissingnessMeasured { measure, value } => {
                info!(%measure, value, "Measured missingness")
            }
            CleaningEvent::DatasetsReconciled {
                keys,
                join,
                rows_before,
                rows_after,
            } => info!(?keys, ?join, rows_before, rows_after, "Reconciled datasets"),
            CleaningEvent::ReconciliationFailed {
                keys,
                primary_columns,
                auxiliary_columns,
                reason,
            } => warn!(
                ?keys,
                ?primary_columns,
                ?auxiliary_columns,
                %reason,
                "Reconciliation failed"
            ),
            CleaningEvent::DateAxisBuilt {
                column,
                start,
                end,
                days,
            } => info!(%column, %start, %end, days, "Built date axis"),
            CleaningEvent::GridBuilt {
                category_column,
                dates,
                categories,
                rows,
            } => info!(%category_column, dates, categories, rows, "Built temporal grid"),
            CleaningEvent::RowsDropped { reason, rows } => info!(%reason, rows, "Dropped rows"),
            CleaningEvent::ColumnsDropped { columns } => info!(?columns, "Dropped columns"),
            CleaningEvent::KeyStandardized {
                column,
                max_chars,
                rows_dropped,
            } => info!(%column, max_chars, rows_dropped, "Standardized key column"),
            CleaningEvent::RowsSorted { column, ascending } => {
                info!(%column, ascending, "Sorted rows by date")
            }
        }
    }
}

/// Wrapper that implements [`EventReporter`] using a closure.
pub struct ClosureEventReporter<F>
where
    F: Fn(CleaningEvent) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureEventReporter<F>
where
    F: Fn(CleaningEvent) + Send + Sync,
{
    /// Creates a new closure-based reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> EventReporter for ClosureEventReporter<F>
where
    F: Fn(CleaningEvent) + Send + Sync,
{
    fn report(&self, event: CleaningEvent) {
        (self.callback)(event);
    }
}

/// Reporter that buffers events in memory, in emission order.
#[derive(Debug, Default)]
pub struct CollectingEventReporter {
    events: Mutex<Vec<CleaningEvent>>,
}

impl CollectingEventReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event received so far.
    pub fn events(&self) -> Vec<CleaningEvent> {
        self.events.lock().clone()
    }

    /// Remove and return the buffered events.
    pub fn take(&self) -> Vec<CleaningEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventReporter for CollectingEventReporter {
    fn report(&self, event: CleaningEvent) {
        self.events.lock().push(event);
    }
}

/// Reporter used by components constructed with `new()`.
pub fn default_reporter() -> Arc<dyn EventReporter> {
    Arc::new(TracingEventReporter)
}

static_assertions::assert_impl_all!(TracingEventReporter: Send, Sync);
static_assertions::assert_impl_all!(CollectingEventReporter: Send, Sync);
static_assertions::assert_impl_all!(CleaningEvent: Send, Sync);
