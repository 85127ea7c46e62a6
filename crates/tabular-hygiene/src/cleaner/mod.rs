//! Dataset cleaning operations.
//!
//! This module provides functionality for:
//! - Column type coercion (text, strict and nullable integers, floats, dates)
//! - Numeric rescaling
//! - Removing duplicate or incomplete rows and unwanted columns
//! - Key column standardization and date ordering

mod converters;
mod sanitizers;
mod type_coercer;

pub use sanitizers::DatasetSanitizer;
pub use type_coercer::TypeCoercer;

pub(crate) use converters::millis_to_date;
pub(crate) use type_coercer::coerce_datetime;
