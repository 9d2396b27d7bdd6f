//! Observability
//!
//! Logging and metrics for configuration loading and validation.

pub mod logging;
pub mod metrics;

pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
