//! Metrics collection.
//!
//! Counters and histograms for source loading, schema composition,
//! configuration loading and validation. Recording is a no-op until
//! [`init_metrics`] installs the Prometheus recorder.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::ConfigMgrError;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder and returns a handle for
/// rendering the exposition text.
///
/// No HTTP listener is started. A second call returns the handle from the
/// first.
///
/// # Errors
///
/// Returns `ConfigMgrError::Metrics` if another recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, ConfigMgrError> {
    if let Some(handle) = HANDLE.get() {
        tracing::debug!("metrics already initialized, reusing handle");
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ConfigMgrError::Metrics(e.to_string()))?;
    describe_metrics();
    Ok(HANDLE.get_or_init(|| handle).clone())
}

fn describe_metrics() {
    describe_counter!(
        "configmgr_sources_loaded_total",
        "Source documents parsed, by format"
    );
    describe_counter!(
        "configmgr_schema_compositions_total",
        "Schema set compositions, by outcome"
    );
    describe_counter!(
        "configmgr_configuration_loads_total",
        "Configuration load and merge runs, by outcome"
    );
    describe_counter!(
        "configmgr_validations_total",
        "Validation runs, by outcome"
    );
    describe_histogram!(
        "configmgr_validation_duration_ms",
        "Validation walk duration in milliseconds"
    );
    describe_histogram!(
        "configmgr_validation_exceptions",
        "Validity exceptions reported per invalid document"
    );
}

const fn outcome(success: bool) -> &'static str {
    if success { "success" } else { "error" }
}

/// Records one parsed source document.
pub fn record_source_loaded(format: &'static str) {
    counter!("configmgr_sources_loaded_total", "format" => format).increment(1);
}

/// Records a schema composition attempt.
pub fn record_schema_composition(success: bool) {
    counter!("configmgr_schema_compositions_total", "outcome" => outcome(success)).increment(1);
}

/// Records a configuration load attempt.
pub fn record_configuration_load(success: bool) {
    counter!("configmgr_configuration_loads_total", "outcome" => outcome(success)).increment(1);
}

/// Outcome label of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// No exceptions
    Valid,
    /// Document has validity exceptions
    Invalid,
    /// The walk could not complete
    Error,
}

impl ValidationOutcome {
    const fn label(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Error => "error",
        }
    }
}

/// Records a validation run and its duration.
pub fn record_validation(outcome: ValidationOutcome, duration: Duration) {
    counter!("configmgr_validations_total", "outcome" => outcome.label()).increment(1);
    histogram!("configmgr_validation_duration_ms").record(duration.as_secs_f64() * 1000.0);
}

/// Records the number of exceptions in an invalid document's report.
#[allow(clippy::cast_precision_loss)]
pub fn record_exception_count(count: usize) {
    histogram!("configmgr_validation_exceptions").record(count as f64);
}
