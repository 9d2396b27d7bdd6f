//! Validation engine
//!
//! Walks a merged document against a composed schema graph and reports
//! every violation as a [`ValidationException`]. Violations found inside
//! `anyOf`, `oneOf` and `allOf` branches are nested under the exception for
//! the combinator that failed.

mod exception;
mod validator;

pub use exception::ValidationException;
pub use validator::{DEFAULT_MAX_VALIDATION_DEPTH, ValidationReport, Validator};
