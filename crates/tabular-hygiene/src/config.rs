//! Configuration types for the cleaning engine.
//!
//! The caller-facing knobs (date formats, join kind, imputation strategy,
//! outlier treatment) live here so that a UI or CLI can build them once and
//! hand them to each component.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default strict date format: day/month/year.
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Default maximum length of a standardized key column.
pub const DEFAULT_KEY_MAX_CHARS: usize = 15;

/// What to do when the strict date format does not match a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateFallback {
    /// Retry with a permissive mixed-format parser that reads day before month
    #[default]
    DayFirst,
    /// Keep the strict format; unmatched values become null
    Disabled,
}

/// Join kind for dataset reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    /// Keep every primary row
    #[default]
    Left,
    /// Keep every auxiliary row
    Right,
    /// Keep only rows with a match on both sides
    Inner,
    /// Keep rows from both sides
    Outer,
}

/// How outliers found by the IQR fence are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierTreatment {
    /// Only count outliers, leave data untouched
    #[default]
    CountOnly,
    /// Replace out-of-fence values with the nearest bound (winsorization)
    Clip,
    /// Drop rows holding out-of-fence values
    Remove,
}

/// Replacement value for constant imputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
        }
    }
}

/// Strategy for filling missing values in a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStrategy {
    /// Propagate the nearest preceding present value
    ForwardFill,
    /// Propagate the nearest following present value
    BackwardFill,
    /// Mean of present values (numeric columns only)
    Mean,
    /// Median of present values (numeric columns only)
    #[default]
    Median,
    /// Most frequent present value
    Mode,
    /// Caller-supplied value of the column's type
    Constant(FillValue),
}

impl ImputationStrategy {
    /// Short identifier used in diagnostics and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ForwardFill => "forward_fill",
            Self::BackwardFill => "backward_fill",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::Constant(_) => "constant",
        }
    }
}

/// Error returned when an identifier does not name a known option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} '{value}'")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for JoinKind {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "inner" => Ok(Self::Inner),
            "outer" | "full" => Ok(Self::Outer),
            other => Err(UnknownOption {
                kind: "join kind",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for OutlierTreatment {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" | "count_only" => Ok(Self::CountOnly),
            "clip" | "cap" => Ok(Self::Clip),
            "remove" => Ok(Self::Remove),
            other => Err(UnknownOption {
                kind: "outlier treatment",
                value: other.to_string(),
            }),
        }
    }
}

/// Parses every strategy except `constant`, which needs a value.
impl FromStr for ImputationStrategy {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ffill" | "forward_fill" => Ok(Self::ForwardFill),
            "bfill" | "backward_fill" => Ok(Self::BackwardFill),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            other => Err(UnknownOption {
                kind: "imputation strategy",
                value: other.to_string(),
            }),
        }
    }
}

/// Date parsing policy shared by coercion, sorting and grid building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateParsePolicy {
    /// chrono strftime format tried first for every value
    pub format: String,
    /// What happens when the strict format fails
    pub fallback: DateFallback,
}

impl Default for DateParsePolicy {
    fn default() -> Self {
        Self {
            format: DEFAULT_DATE_FORMAT.to_string(),
            fallback: DateFallback::default(),
        }
    }
}

/// Configuration for the cleaning engine.
///
/// Use [`CleaningConfig::builder()`] to create a configuration with the
/// fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use tabular_hygiene::config::{CleaningConfig, JoinKind, OutlierTreatment};
///
/// let config = CleaningConfig::builder()
///     .date_format("%Y-%m-%d")
///     .join_kind(JoinKind::Inner)
///     .outlier_treatment(OutlierTreatment::Clip)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Strict date format tried before the fallback parser.
    /// Default: "%d/%m/%Y"
    pub date_format: String,

    /// Fallback policy when the strict format fails.
    /// Default: DayFirst
    pub date_fallback: DateFallback,

    /// Join kind used for reconciliation.
    /// Default: Left
    pub join_kind: JoinKind,

    /// Strategy used when imputing a column without an explicit choice.
    /// Default: Median
    pub imputation: ImputationStrategy,

    /// Treatment applied to outliers.
    /// Default: CountOnly
    pub outlier_treatment: OutlierTreatment,

    /// Maximum characters kept when standardizing key columns.
    /// Default: 15
    pub key_max_chars: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            date_fallback: DateFallback::default(),
            join_kind: JoinKind::default(),
            imputation: ImputationStrategy::default(),
            outlier_treatment: OutlierTreatment::default(),
            key_max_chars: DEFAULT_KEY_MAX_CHARS,
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Date parsing policy derived from this configuration.
    pub fn date_policy(&self) -> DateParsePolicy {
        DateParsePolicy {
            format: self.date_format.clone(),
            fallback: self.date_fallback,
        }
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        validate_date_format(&self.date_format)?;

        if self.key_max_chars == 0 {
            return Err(ConfigValidationError::InvalidKeyLength(self.key_max_chars));
        }

        if let ImputationStrategy::Constant(FillValue::Float(v)) = &self.imputation
            && !v.is_finite()
        {
            return Err(ConfigValidationError::InvalidFillValue(v.to_string()));
        }

        Ok(())
    }
}

/// Check that a strftime format is non-empty and well formed.
pub fn validate_date_format(format: &str) -> Result<(), ConfigValidationError> {
    if format.trim().is_empty() {
        return Err(ConfigValidationError::InvalidDateFormat(format.to_string()));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigValidationError::InvalidDateFormat(format.to_string()));
    }
    Ok(())
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid date format '{0}'")]
    InvalidDateFormat(String),

    #[error("Invalid key length: {0} (must be at least 1)")]
    InvalidKeyLength(usize),

    #[error("Invalid constant fill value: {0}")]
    InvalidFillValue(String),
}

impl From<ConfigValidationError> for crate::error::CleaningError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::CleaningError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    date_format: Option<String>,
    date_fallback: Option<DateFallback>,
    join_kind: Option<JoinKind>,
    imputation: Option<ImputationStrategy>,
    outlier_treatment: Option<OutlierTreatment>,
    key_max_chars: Option<usize>,
}

impl CleaningConfigBuilder {
    /// Set the strict date format (chrono strftime syntax).
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Set the fallback policy for dates that miss the strict format.
    pub fn date_fallback(mut self, fallback: DateFallback) -> Self {
        self.date_fallback = Some(fallback);
        self
    }

    /// Set the join kind used by reconciliation.
    pub fn join_kind(mut self, kind: JoinKind) -> Self {
        self.join_kind = Some(kind);
        self
    }

    /// Set the default imputation strategy.
    pub fn imputation(mut self, strategy: ImputationStrategy) -> Self {
        self.imputation = Some(strategy);
        self
    }

    /// Set the outlier treatment.
    pub fn outlier_treatment(mut self, treatment: OutlierTreatment) -> Self {
        self.outlier_treatment = Some(treatment);
        self
    }

    /// Set the maximum length of standardized key columns.
    pub fn key_max_chars(mut self, max_chars: usize) -> Self {
        self.key_max_chars = Some(max_chars);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let config = CleaningConfig {
            date_format: self
                .date_format
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
            date_fallback: self.date_fallback.unwrap_or_default(),
            join_kind: self.join_kind.unwrap_or_default(),
            imputation: self.imputation.unwrap_or_default(),
            outlier_treatment: self.outlier_treatment.unwrap_or_default(),
            key_max_chars: self.key_max_chars.unwrap_or(DEFAULT_KEY_MAX_CHARS),
        };

        config.validate()?;
        Ok(config)
    }
}
