//! Outlier handling module.
//!
//! Outliers are values strictly outside the Tukey fences
//! `Q1 − 1.5 × IQR` and `Q3 + 1.5 × IQR`, with quartiles linearly
//! interpolated over the present values of a numeric column.

mod bounds;
mod engine;
mod summary;

pub use bounds::{FENCE_MULTIPLIER, OutlierBounds, quantile, skewness};
pub use engine::{ColumnOutliers, OutlierCounts, OutlierEngine};
pub use summary::{OutlierSummary, OutlierSummaryRow, SUMMARY_STATISTICS};
