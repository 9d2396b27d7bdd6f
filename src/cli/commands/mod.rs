//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod export;
pub mod extract;
pub mod validate;
pub mod version;

use crate::cli::args::{Cli, Commands, SourceArgs};
use crate::error::ConfigMgrError;
use crate::manager::{ConfigManager, ManagerOptions};
use crate::merge::MergeOptions;
use crate::validation::ValidationReport;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), ConfigMgrError> {
    match cli.command {
        Commands::Validate(args) => validate::run(&args),
        Commands::Extract(args) => extract::run(&args),
        Commands::Export(args) => export::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Runs the full lifecycle for one configuration and returns the manager
/// holding it along with its report.
///
/// # Errors
///
/// Returns the first lifecycle failure.
pub fn load_and_validate(
    source: &SourceArgs,
) -> Result<(ConfigManager, ValidationReport), ConfigMgrError> {
    let options = ManagerOptions {
        merge: if source.concat_arrays {
            MergeOptions::concatenate()
        } else {
            MergeOptions::default()
        },
        ..ManagerOptions::default()
    };
    let manager = ConfigManager::with_options(options);
    let name = source.name.as_str();

    manager.add_config(name)?;
    manager.set_config_path(name, &source.config_path)?;
    manager.load_schemas(name, &source.schemas)?;
    manager.load_configuration(name)?;
    let report = manager.validate(name)?;
    Ok((manager, report))
}

/// Fails with [`ConfigMgrError::InvalidDocument`] unless `report` is clean.
///
/// # Errors
///
/// Returns `InvalidDocument` when the report has exceptions.
pub fn require_valid(name: &str, report: &ValidationReport) -> Result<(), ConfigMgrError> {
    if let Some(tree) = report.exception_tree() {
        tracing::warn!(name, "refusing to use an invalid configuration");
        eprint!("{tree}");
        return Err(ConfigMgrError::InvalidDocument {
            name: name.to_string(),
            exceptions: report.exception_count(),
        });
    }
    Ok(())
}
