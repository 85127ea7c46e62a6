//! Error types for the cleaning engine.
//!
//! Every component raises [`CleaningError`] on invalid input. Errors are
//! serializable as `{ code, message }` so a UI layer can display them
//! without matching on variants.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for cleaning operations.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// A referenced column does not exist on the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A strict conversion met a value it cannot represent.
    #[error("Cannot convert value '{value}' in column '{column}' to {target}")]
    TypeCoercion {
        column: String,
        value: String,
        target: String,
    },

    /// An imputation strategy cannot be applied to the column.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    Imputation { column: String, reason: String },

    /// A numeric-only operation was requested on a non-numeric column.
    #[error("Column '{column}' has non-numeric type {dtype}")]
    NotNumeric { column: String, dtype: String },

    /// No present values in a column for a statistic that needs them.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// An enrichment join could not be performed.
    #[error(
        "Failed to reconcile datasets on keys {keys:?}: {reason} \
         (primary columns: {primary_columns:?}, auxiliary columns: {auxiliary_columns:?})"
    )]
    Reconciliation {
        keys: Vec<String>,
        primary_columns: Vec<String>,
        auxiliary_columns: Vec<String>,
        reason: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for callers that branch on the failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::TypeCoercion { .. } => "TYPE_COERCION_FAILED",
            Self::Imputation { .. } => "IMPUTATION_FAILED",
            Self::NotNumeric { .. } => "NOT_NUMERIC",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::Reconciliation { .. } => "RECONCILIATION_FAILED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the error comes from the shape of the input (bad column
    /// names or types) rather than from the engine itself.
    pub fn is_schema_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_) | Self::NotNumeric { .. } => true,
            Self::WithContext { source, .. } => source.is_schema_error(),
            _ => false,
        }
    }
}

impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}
