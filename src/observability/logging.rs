//! Logging initialization.
//!
//! Structured logging via `tracing` with human-readable and JSON output,
//! verbosity from the command line, and an environment override via
//! `CONFIGMGR_LOG_LEVEL`.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable that overrides the verbosity-derived filter.
pub const LOG_LEVEL_ENV: &str = "CONFIGMGR_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON.
    Json,
}

/// Builds the default filter for a verbosity level.
///
/// Dependencies stay at `warn`. At `-vv` the crate logs at `debug` except
/// schema composition and the validation walk, whose per-reference and
/// per-keyword events only appear from `-vvv`.
#[must_use]
pub fn default_filter(verbosity: u8) -> String {
    let (crate_level, walk_level) = match verbosity {
        0 => ("warn", "warn"),
        1 => ("info", "info"),
        2 => ("debug", "info"),
        _ => ("trace", "trace"),
    };
    format!(
        "warn,configmgr={crate_level},configmgr::schema={walk_level},configmgr::validation={walk_level}"
    )
}

/// Resolves whether ANSI colour should be used on stderr.
#[must_use]
pub fn use_ansi(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Auto => {
            std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Installs the global tracing subscriber on stderr.
///
/// `CONFIGMGR_LOG_LEVEL`, when set to a valid filter, takes precedence over
/// `verbosity`. Repeated calls are ignored.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let show_target = verbosity >= 2;

    match format {
        LogFormat::Human => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(use_ansi(color))
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_default_is_human() {
        assert_eq!(LogFormat::default(), LogFormat::Human);
    }

    #[test]
    fn repeated_init_is_ignored() {
        init_logging(LogFormat::Human, 0, ColorChoice::Never);
        init_logging(LogFormat::Json, 3, ColorChoice::Never);
    }

    #[test]
    fn quiet_default_is_warn_everywhere() {
        let filter = default_filter(0);
        assert!(filter.starts_with("warn,"));
        assert!(!filter.contains("info") && !filter.contains("debug"));
    }

    #[test]
    fn debug_keeps_schema_and_validation_at_info() {
        let filter = default_filter(2);
        assert!(filter.contains("configmgr=debug"));
        assert!(filter.contains("configmgr::schema=info"));
        assert!(filter.contains("configmgr::validation=info"));
    }

    #[test]
    fn trace_opens_every_module() {
        assert_eq!(default_filter(3), default_filter(u8::MAX));
        assert!(default_filter(3).contains("configmgr::validation=trace"));
    }

    #[test]
    fn default_filters_parse() {
        for verbosity in 0..=3 {
            assert!(EnvFilter::try_new(default_filter(verbosity)).is_ok());
        }
    }

    #[test]
    fn explicit_color_choices() {
        assert!(use_ansi(ColorChoice::Always));
        assert!(!use_ansi(ColorChoice::Never));
    }
}
