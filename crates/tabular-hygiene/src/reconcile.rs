//! Key-based enrichment of a primary dataset with auxiliary columns.

use std::sync::Arc;

use polars::prelude::*;
use tracing::debug;

use crate::config::{CleaningConfig, JoinKind};
use crate::error::{CleaningError, Result};
use crate::events::{CleaningEvent, EventReporter, default_reporter};
use crate::utils::column_names;

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Left => JoinType::Left,
            JoinKind::Right => JoinType::Right,
            JoinKind::Inner => JoinType::Inner,
            JoinKind::Outer => JoinType::Full,
        }
    }
}

/// Joins a projection of an auxiliary dataset onto a primary one.
///
/// The auxiliary dataset is reduced to the join keys plus the requested
/// columns before joining. Key columns are coalesced so the result holds
/// each key once, whatever the join kind.
pub struct DatasetReconciler {
    join_kind: JoinKind,
    reporter: Arc<dyn EventReporter>,
}

impl Default for DatasetReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetReconciler {
    pub fn new() -> Self {
        Self {
            join_kind: JoinKind::default(),
            reporter: default_reporter(),
        }
    }

    pub fn with_reporter(reporter: Arc<dyn EventReporter>) -> Self {
        Self {
            join_kind: JoinKind::default(),
            reporter,
        }
    }

    /// Reconciler joining with the configured `join_kind`.
    pub fn from_config(config: &CleaningConfig) -> Self {
        Self::new().with_join_kind(config.join_kind)
    }

    pub fn with_join_kind(mut self, kind: JoinKind) -> Self {
        self.join_kind = kind;
        self
    }

    /// Join kind used by [`enrich`](Self::enrich).
    pub fn join_kind(&self) -> JoinKind {
        self.join_kind
    }

    /// [`reconcile`](Self::reconcile) with the reconciler's own join kind.
    pub fn enrich<S: AsRef<str>>(
        &self,
        primary: &DataFrame,
        auxiliary: &DataFrame,
        keys: &[S],
        columns: &[S],
    ) -> Result<DataFrame> {
        self.reconcile(primary, auxiliary, keys, columns, self.join_kind)
    }

    /// Join `auxiliary[keys ∪ columns]` onto `primary` by `keys`.
    ///
    /// Missing keys or columns, mismatched key types and join failures are
    /// returned as [`CleaningError::Reconciliation`] carrying the column
    /// lists of both inputs. A `ReconciliationFailed` event is emitted too.
    pub fn reconcile<S: AsRef<str>>(
        &self,
        primary: &DataFrame,
        auxiliary: &DataFrame,
        keys: &[S],
        columns: &[S],
        kind: JoinKind,
    ) -> Result<DataFrame> {
        let keys: Vec<String> = keys.iter().map(|k| k.as_ref().to_string()).collect();
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();

        match join(primary, auxiliary, &keys, &columns, kind) {
            Ok(joined) => {
                self.reporter.report(CleaningEvent::DatasetsReconciled {
                    keys,
                    join: kind,
                    rows_before: primary.height(),
                    rows_after: joined.height(),
                });
                Ok(joined)
            }
            Err(reason) => {
                let primary_columns = column_names(primary);
                let auxiliary_columns = column_names(auxiliary);
                self.reporter.report(CleaningEvent::ReconciliationFailed {
                    keys: keys.clone(),
                    primary_columns: primary_columns.clone(),
                    auxiliary_columns: auxiliary_columns.clone(),
                    reason: reason.clone(),
                });
                Err(CleaningError::Reconciliation {
                    keys,
                    primary_columns,
                    auxiliary_columns,
                    reason,
                })
            }
        }
    }

    /// Like [`reconcile`](Self::reconcile), but a failed join hands back
    /// `primary` unchanged after reporting the failure.
    pub fn reconcile_or_keep<S: AsRef<str>>(
        &self,
        primary: DataFrame,
        auxiliary: &DataFrame,
        keys: &[S],
        columns: &[S],
        kind: JoinKind,
    ) -> DataFrame {
        match self.reconcile(&primary, auxiliary, keys, columns, kind) {
            Ok(joined) => joined,
            Err(error) => {
                debug!(%error, "Keeping primary dataset unchanged");
                primary
            }
        }
    }
}

/// Validate and run the join. Errors are plain reasons; the caller adds
/// the dataset context.
fn join(
    primary: &DataFrame,
    auxiliary: &DataFrame,
    keys: &[String],
    columns: &[String],
    kind: JoinKind,
) -> std::result::Result<DataFrame, String> {
    if keys.is_empty() {
        return Err("no join keys given".to_string());
    }

    for key in keys {
        let left = primary
            .column(key)
            .map_err(|_| format!("key '{key}' missing from primary dataset"))?;
        let right = auxiliary
            .column(key)
            .map_err(|_| format!("key '{key}' missing from auxiliary dataset"))?;
        if left.dtype() != right.dtype() {
            return Err(format!(
                "key '{key}' has type {} in primary but {} in auxiliary",
                left.dtype(),
                right.dtype()
            ));
        }
    }

    let mut projection: Vec<&str> = keys.iter().map(String::as_str).collect();
    for column in columns {
        if auxiliary.column(column).is_err() {
            return Err(format!("column '{column}' missing from auxiliary dataset"));
        }
        if !projection.contains(&column.as_str()) {
            projection.push(column);
        }
    }

    let reduced = auxiliary.select(projection).map_err(|e| e.to_string())?;
    let on: Vec<Expr> = keys.iter().map(|k| col(k.as_str())).collect();
    let args = JoinArgs::new(kind.into()).with_coalesce(JoinCoalesce::CoalesceColumns);

    primary
        .clone()
        .lazy()
        .join(reduced.lazy(), on.clone(), on, args)
        .collect()
        .map_err(|e| e.to_string())
}
