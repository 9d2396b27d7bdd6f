//! `validate` command
//!
//! Prints the exception tree of a merged configuration.

use serde_json::json;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::error::{ConfigMgrError, SerializationError};
use crate::validation::ValidationReport;

use super::load_and_validate;

/// Load, merge, and validate, then report.
///
/// # Errors
///
/// Returns any lifecycle error, or `InvalidDocument` after printing the
/// report when the configuration does not conform.
pub fn run(args: &ValidateArgs) -> Result<(), ConfigMgrError> {
    let name = args.source.name.as_str();
    let (_, report) = load_and_validate(&args.source)?;

    match args.format {
        OutputFormat::Human => print!("{}", render_human(name, &report)),
        OutputFormat::Json => println!("{}", render_json(name, &report)?),
    }

    if report.is_valid() {
        Ok(())
    } else {
        Err(ConfigMgrError::InvalidDocument {
            name: name.to_string(),
            exceptions: report.exception_count(),
        })
    }
}

fn render_human(name: &str, report: &ValidationReport) -> String {
    report.exception_tree().map_or_else(
        || format!("{name}: valid\n"),
        |tree| format!("{name}: {} exception(s)\n{tree}", report.exception_count()),
    )
}

fn render_json(name: &str, report: &ValidationReport) -> Result<String, SerializationError> {
    let value = json!({
        "name": name,
        "valid": report.is_valid(),
        "exception_count": report.exception_count(),
        "exceptions": report.exception_tree(),
    });
    Ok(serde_json::to_string(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationException;

    fn invalid() -> ValidationReport {
        ValidationReport::from_exceptions(vec![
            ValidationException::new("type", "/port", "expected integer at /port"),
            ValidationException::new("required", "", "missing required property 'zowe' at /"),
        ])
    }

    #[test]
    fn test_human_valid() {
        assert_eq!(render_human("cfg", &ValidationReport::valid()), "cfg: valid\n");
    }

    #[test]
    fn test_human_invalid_lists_tree() {
        let text = render_human("cfg", &invalid());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "cfg: 2 exception(s)");
        assert_eq!(lines[1], "2 validity exceptions");
        assert_eq!(lines[2], "  expected integer at /port");
    }

    #[test]
    fn test_json_report() {
        let text = render_json("cfg", &invalid()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["valid"], false);
        assert_eq!(value["exception_count"], 2);
        assert_eq!(value["exceptions"]["children"][0]["keyword"], "type");

        let text = render_json("cfg", &ValidationReport::valid()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["valid"], true);
        assert!(value["exceptions"].is_null());
    }
}
