//! Shared integration-test helpers: fixture paths, locator strings, and a
//! runner for the built `configmgr` binary.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

use configmgr::manager::ConfigManager;

/// Returns the path to a test fixture.
#[must_use]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Joins fixture paths into a `:`-separated locator list.
#[must_use]
pub fn fixture_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| fixture_path(name).display().to_string())
        .collect::<Vec<_>>()
        .join(":")
}

/// `FILE(...)` locator for a fixture.
#[must_use]
pub fn file_locator(name: &str) -> String {
    format!("FILE({})", fixture_path(name).display())
}

/// Root and common server schemas, root first.
#[must_use]
pub fn server_schemas() -> String {
    fixture_list(&["schemas/server-base.json", "schemas/server-common.json"])
}

/// Registers `name` and runs the lifecycle through `load_configuration`.
#[allow(clippy::missing_panics_doc)]
pub fn loaded_manager(name: &str, sources: &str, schemas: &str) -> ConfigManager {
    let manager = ConfigManager::new();
    manager.add_config(name).expect("add_config");
    manager.set_config_path(name, sources).expect("set_config_path");
    manager.load_schemas(name, schemas).expect("load_schemas");
    manager.load_configuration(name).expect("load_configuration");
    manager
}

/// Runs the `configmgr` binary with `args` and waits for it to exit.
#[allow(clippy::missing_panics_doc)]
pub fn run_configmgr(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_configmgr"))
        .args(args)
        .env_remove("CONFIGMGR_SCHEMAS")
        .env_remove("CONFIGMGR_CONFIG_PATH")
        .env_remove("CONFIGMGR_LOG_LEVEL")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to spawn configmgr")
}
