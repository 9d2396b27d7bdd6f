//! `extract` command

use crate::cli::args::ExtractArgs;
use crate::document::DocumentNode;
use crate::error::ConfigMgrError;

use super::{load_and_validate, require_valid};

/// Print the value at `args.path` from a validated configuration.
///
/// # Errors
///
/// Returns lifecycle errors, `InvalidDocument`, or the lookup failure.
pub fn run(args: &ExtractArgs) -> Result<(), ConfigMgrError> {
    let name = args.source.name.as_str();
    let (manager, report) = load_and_validate(&args.source)?;
    require_valid(name, &report)?;

    let value = manager.get_value(name, &args.path)?;
    println!("{}", render_value(&value));
    Ok(())
}

/// Strings print without quotes; everything else prints as compact JSON.
fn render_value(value: &DocumentNode) -> String {
    match value {
        DocumentNode::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_print_raw() {
        assert_eq!(render_value(&DocumentNode::from("IBMUSER")), "IBMUSER");
        assert_eq!(render_value(&DocumentNode::Integer(7554)), "7554");
        assert_eq!(render_value(&DocumentNode::Bool(true)), "true");
        assert_eq!(render_value(&DocumentNode::Null), "null");
    }

    #[test]
    fn test_composites_print_json() {
        let value = DocumentNode::from(json!({"a": [1, "b"]}));
        assert_eq!(render_value(&value), r#"{"a":[1,"b"]}"#);
    }
}
