//! `configmgr` - layered configuration manager
//!
//! Loads configuration segments from an ordered list of JSON and YAML
//! sources, overlays them into one document, composes a set of JSON Schema
//! documents into a single schema graph, and validates the merged document
//! against it. Validated configurations can be read by path or exported as
//! YAML or JSON.
//!
//! ```no_run
//! use configmgr::manager::ConfigManager;
//!
//! # fn main() -> configmgr::error::Result<()> {
//! let manager = ConfigManager::new();
//! manager.add_config("zowe")?;
//! manager.set_config_path("zowe", "FILE(defaults.yaml):FILE(zowe.yaml)")?;
//! manager.load_schemas("zowe", "schemas/zowe.json:schemas/common.json")?;
//! manager.load_configuration("zowe")?;
//! let report = manager.validate("zowe")?;
//! if report.is_valid() {
//!     println!("{}", manager.get_str("zowe", "zowe.setup.dataset.prefix")?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod document;
pub mod error;
pub mod export;
pub mod manager;
pub mod merge;
pub mod observability;
pub mod schema;
pub mod source;
pub mod validation;
