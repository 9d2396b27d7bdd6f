mod common;

use common::{file_locator, fixture_path, loaded_manager, server_schemas};
use configmgr::document::DocumentNode;
use configmgr::error::{ConfigMgrError, LookupError};
use configmgr::source::SourceLoader;

fn validated(sources: &str) -> configmgr::manager::ConfigManager {
    let manager = loaded_manager("cfg", sources, &server_schemas());
    assert!(manager.validate("cfg").unwrap().is_valid());
    manager
}

fn layered() -> String {
    format!(
        "{}:{}",
        file_locator("config/defaults.yaml"),
        file_locator("config/site.yaml")
    )
}

#[test]
fn yaml_export_rereads_to_the_merged_document() {
    let manager = validated(&layered());
    let yaml = manager.write_yaml("cfg").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.yaml");
    std::fs::write(&path, &yaml).unwrap();
    let reread = SourceLoader::default().load_path(&path).unwrap().document;
    assert_eq!(&reread, manager.get_config_data("cfg").unwrap().as_ref());
}

#[test]
fn export_preserves_first_seen_key_order() {
    let manager = validated(&layered());
    let yaml = manager.write_yaml("cfg").unwrap();
    let zowe = yaml.find("zowe:").unwrap();
    let components = yaml.find("components:").unwrap();
    assert!(zowe < components, "{yaml}");

    let json = manager.write_json("cfg", false).unwrap();
    let gateway = json.find("\"gateway\"").unwrap();
    let discovery = json.find("\"discovery\"").unwrap();
    assert!(gateway < discovery, "{json}");
}

#[test]
fn yaml_quotes_strings_that_look_like_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let extra = dir.path().join("build.yaml");
    std::fs::write(&extra, "build: \"8080\"\n").unwrap();
    let sources = format!("{}:{}", file_locator("config/defaults.yaml"), extra.display());

    let manager = validated(&sources);
    let yaml = manager.write_yaml("cfg").unwrap();
    assert!(
        yaml.contains("build: '8080'") || yaml.contains("build: \"8080\""),
        "{yaml}"
    );
    assert_eq!(manager.get_str("cfg", "build").unwrap(), "8080");
}

#[test]
fn json_export_parses_back() {
    let manager = validated(&layered());
    let json = manager.write_json("cfg", true).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["zowe"]["setup"]["dataset"]["prefix"], "SYS1.ZWE");
    assert_eq!(value["components"]["gateway"]["port"], 7554);
}

#[test]
fn typed_getters_report_mismatches() {
    let manager = validated(&file_locator("config/defaults.yaml"));
    match manager.get_i64("cfg", "zowe.runtimeDirectory").unwrap_err() {
        ConfigMgrError::Lookup(LookupError::TypeMismatch { expected, found, .. }) => {
            assert_eq!(expected, "integer");
            assert_eq!(found, "string");
        }
        other => panic!("expected type mismatch, got {other}"),
    }
    assert!(matches!(
        manager.get_value("cfg", "zowe.nope").unwrap_err(),
        ConfigMgrError::Lookup(LookupError::MissingKey { .. })
    ));
    assert_eq!(
        manager.get_value("cfg", "/zowe/launcher/restartIntervals/1").unwrap(),
        DocumentNode::Integer(2)
    );
}

#[test]
fn json_sources_merge_with_yaml() {
    let sources = format!(
        "{}:{}",
        file_locator("config/defaults.yaml"),
        fixture_path("config/app.json").display()
    );
    let manager = validated(&sources);
    assert!(manager.get_bool("cfg", "components.app-server.enabled").unwrap());
    assert!(manager.get_bool("cfg", "components.gateway.enabled").unwrap());
}
