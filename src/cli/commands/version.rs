//! `version` command
//!
//! Prints the package version, plus the accepted source extensions and exit
//! codes in JSON mode so scripts can check what this build supports.

use serde_json::json;

use crate::cli::args::{OutputFormat, VersionArgs};
use crate::error::ExitCode;
use crate::source::DIR_EXTENSIONS;

/// Renders version information in the requested format.
#[must_use]
pub fn render(format: OutputFormat) -> String {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    match format {
        OutputFormat::Human => format!("{name} {version}"),
        OutputFormat::Json => json!({
            "name": name,
            "version": version,
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "sourceExtensions": DIR_EXTENSIONS,
            "exitCodes": {
                "success": ExitCode::SUCCESS,
                "error": ExitCode::ERROR,
                "configError": ExitCode::CONFIG_ERROR,
                "ioError": ExitCode::IO_ERROR,
                "schemaError": ExitCode::SCHEMA_ERROR,
                "invalidDocument": ExitCode::INVALID_DOCUMENT,
                "serializationError": ExitCode::SERIALIZATION_ERROR,
                "lookupError": ExitCode::LOOKUP_ERROR,
                "usageError": ExitCode::USAGE_ERROR,
            },
        })
        .to_string(),
    }
}

/// Print version information.
pub fn run(args: &VersionArgs) {
    println!("{}", render(args.format));
}
