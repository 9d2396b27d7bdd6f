//! `export` command

use crate::cli::args::ExportArgs;
use crate::error::ConfigMgrError;
use crate::export::{self, ExportFormat};

use super::{load_and_validate, require_valid};

/// Print a validated configuration in the requested format.
///
/// # Errors
///
/// Returns lifecycle errors, `InvalidDocument` for a non-conforming
/// configuration, or an emitter failure.
pub fn run(args: &ExportArgs) -> Result<(), ConfigMgrError> {
    let name = args.source.name.as_str();
    let (manager, report) = load_and_validate(&args.source)?;
    require_valid(name, &report)?;

    let document = manager.get_config_data(name)?;
    let format = ExportFormat::from(args.format);
    let text = export::render(&document, format)?;
    tracing::debug!(name, %format, bytes = text.len(), "exported configuration");
    print!("{text}");
    Ok(())
}
