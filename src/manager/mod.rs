//! Configuration manager facade
//!
//! [`ConfigManager`] is the single entry point callers use. Each named
//! configuration moves through
//! `Registered -> PathSet -> SchemasLoaded -> ConfigurationLoaded -> Validated`,
//! and every operation checks the state it needs before touching anything.
//! Sources and schemas are read outside the registry's locks; results are
//! committed afterwards.

mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::document::DocumentNode;
use crate::error::{
    ConfigMgrError, Result, SchemaError, SerializationError, SourceError, UsageError,
};
use crate::export;
use crate::merge::{MergeOptions, merge_all};
use crate::observability::metrics::{self, ValidationOutcome};
use crate::schema::SchemaRegistry;
use crate::source::{SourceLimits, SourceLoader, SourceLocator, SourceReader, env_or};
use crate::validation::{DEFAULT_MAX_VALIDATION_DEPTH, ValidationReport, Validator};

pub use store::{LifecycleState, NamedConfiguration};

// ============================================================================
// Options
// ============================================================================

/// Manager-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerOptions {
    /// How source documents are overlaid.
    pub merge: MergeOptions,
    /// Limits applied to every source and schema read.
    pub source_limits: SourceLimits,
    /// Maximum schema recursion depth during validation.
    pub max_validation_depth: usize,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            merge: MergeOptions::default(),
            source_limits: SourceLimits::default(),
            max_validation_depth: env_or(
                "CONFIGMGR_MAX_VALIDATION_DEPTH",
                DEFAULT_MAX_VALIDATION_DEPTH,
            ),
        }
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Registry of named configurations.
///
/// Operations on different names are independent and may run from
/// different threads.
#[derive(Debug)]
pub struct ConfigManager {
    configs: DashMap<String, NamedConfiguration>,
    loader: SourceLoader,
    registry: SchemaRegistry,
    options: ManagerOptions,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Creates a manager with options from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ManagerOptions::default())
    }

    /// Creates a manager over the local filesystem.
    #[must_use]
    pub fn with_options(options: ManagerOptions) -> Self {
        Self::with_reader(Arc::new(crate::source::FsReader), options)
    }

    /// Creates a manager that reads sources and schemas through `reader`.
    #[must_use]
    pub fn with_reader(reader: Arc<dyn SourceReader>, options: ManagerOptions) -> Self {
        let loader = SourceLoader::with_reader(reader, options.source_limits);
        Self {
            configs: DashMap::new(),
            registry: SchemaRegistry::new(loader.clone()),
            loader,
            options,
        }
    }

    /// Settings in effect.
    #[must_use]
    pub const fn options(&self) -> &ManagerOptions {
        &self.options
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Registers a new configuration name.
    ///
    /// # Errors
    ///
    /// `UsageError::EmptyName` for `""`, `DuplicateName` if already present.
    pub fn add_config(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(UsageError::EmptyName.into());
        }
        match self.configs.entry(name.to_string()) {
            Entry::Occupied(_) => {
                tracing::warn!(name, "configuration already registered");
                Err(ConfigMgrError::DuplicateName(name.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(NamedConfiguration::default());
                tracing::info!(name, "registered configuration");
                Ok(())
            }
        }
    }

    /// Sets the source locator list, replacing any previous one. The merged
    /// document and report are dropped; an installed schema graph is kept.
    ///
    /// # Errors
    ///
    /// `UnknownName`, or a `SourceError` if the locator list does not parse.
    pub fn set_config_path(&self, name: &str, locator: &str) -> Result<()> {
        self.require(name, "set the path of", LifecycleState::Registered)?;
        let locators = SourceLocator::parse_list(locator).inspect_err(|e| {
            tracing::warn!(name, error = %e, "rejected source locator");
        })?;
        let count = locators.len();
        self.commit(name, |cfg| cfg.set_sources(locators))?;
        tracing::info!(name, sources = count, "set configuration path");
        Ok(())
    }

    /// Loads and composes the schema locator list. The first document is the
    /// root schema.
    ///
    /// # Errors
    ///
    /// `OutOfOrder` before a path is set; `SchemaError` if loading or
    /// composition fails, in which case any previous graph stays installed.
    pub fn load_schemas(&self, name: &str, locators: &str) -> Result<()> {
        self.require(name, "load schemas for", LifecycleState::PathSet)?;
        let parsed = SourceLocator::parse_list(locators).map_err(SchemaError::from)?;
        let graph = self.registry.load_schemas(locators).inspect_err(|e| {
            tracing::warn!(name, error = %e, "schema composition failed");
        })?;
        let (documents, schemas) = (graph.documents().len(), graph.len());
        self.commit(name, |cfg| cfg.install_graph(parsed, graph))?;
        tracing::info!(name, documents, schemas, "loaded schemas");
        Ok(())
    }

    /// Loads every source and merges them left to right.
    ///
    /// # Errors
    ///
    /// `OutOfOrder` before schemas are loaded; the `SourceError` of the
    /// first failing source, in which case the previous merged document
    /// stays installed.
    pub fn load_configuration(&self, name: &str) -> Result<()> {
        let locators = self.require(name, "load configuration for", LifecycleState::SchemasLoaded)?
            .source_locators
            .clone();

        let result = self.load_and_merge(&locators);
        metrics::record_configuration_load(result.is_ok());
        let (merged, count) = result.inspect_err(|e| {
            tracing::warn!(name, error = %e, "configuration load failed");
        })?;

        self.commit(name, |cfg| cfg.install_merged(merged))?;
        tracing::info!(name, sources = count, "loaded configuration");
        Ok(())
    }

    fn load_and_merge(&self, locators: &[SourceLocator]) -> std::result::Result<(DocumentNode, usize), SourceError> {
        let sources = self.loader.load_all(locators)?;
        let count = sources.len();
        let merged = merge_all(sources.into_iter().map(|s| s.document), self.options.merge)
            .ok_or_else(|| SourceError::Empty {
                path: PathBuf::from(
                    locators
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(":"),
                ),
            })?;
        Ok((merged, count))
    }

    /// Validates the merged document against the installed schema graph and
    /// stores the report.
    ///
    /// # Errors
    ///
    /// `OutOfOrder` before the configuration is loaded;
    /// `ValidationError::DepthExceeded` when the walk cannot complete. A
    /// non-conforming document is not an error.
    pub fn validate(&self, name: &str) -> Result<ValidationReport> {
        let (graph, merged) = {
            let cfg = self.require(name, "validate", LifecycleState::ConfigurationLoaded)?;
            match (&cfg.graph, &cfg.merged) {
                (Some(graph), Some(merged)) => (Arc::clone(graph), Arc::clone(merged)),
                _ => {
                    return Err(UsageError::OutOfOrder {
                        name: name.to_string(),
                        operation: "validate",
                        state: cfg.state(),
                    }
                    .into());
                }
            }
        };

        let started = Instant::now();
        let result = Validator::new(&graph)
            .with_max_depth(self.options.max_validation_depth)
            .validate(&merged);
        let elapsed = started.elapsed();

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                metrics::record_validation(ValidationOutcome::Error, elapsed);
                tracing::warn!(name, error = %e, "validation could not complete");
                return Err(e.into());
            }
        };

        if report.is_valid() {
            metrics::record_validation(ValidationOutcome::Valid, elapsed);
            tracing::info!(name, "configuration is valid");
        } else {
            let count = report.exception_count();
            metrics::record_validation(ValidationOutcome::Invalid, elapsed);
            metrics::record_exception_count(count);
            tracing::info!(name, exceptions = count, "configuration has validity exceptions");
        }

        let stored = report.clone();
        self.commit(name, |cfg| cfg.report = Some(stored))?;
        Ok(report)
    }

    /// Drops a configuration.
    ///
    /// # Errors
    ///
    /// `UnknownName` if not registered.
    pub fn remove_config(&self, name: &str) -> Result<()> {
        if self.configs.remove(name).is_none() {
            return Err(self.unknown(name));
        }
        tracing::info!(name, "removed configuration");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Current lifecycle state of `name`.
    ///
    /// # Errors
    ///
    /// `UnknownName` if not registered.
    pub fn state(&self, name: &str) -> Result<LifecycleState> {
        Ok(self.require(name, "inspect", LifecycleState::Registered)?.state())
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// The report stored by the last successful [`validate`](Self::validate).
    ///
    /// # Errors
    ///
    /// `UnknownName` if not registered.
    pub fn validation_report(&self, name: &str) -> Result<Option<ValidationReport>> {
        Ok(self
            .require(name, "inspect", LifecycleState::Registered)?
            .report
            .clone())
    }

    // ------------------------------------------------------------------------
    // Data access
    // ------------------------------------------------------------------------

    /// The merged document, shared read-only.
    ///
    /// # Errors
    ///
    /// `SerializationError::NoDocument` before the configuration is loaded,
    /// `OutOfOrder` before it is validated.
    pub fn get_config_data(&self, name: &str) -> Result<Arc<DocumentNode>> {
        self.validated_document(name, "read data of")
    }

    /// Value at a JSON pointer or dotted path in the merged document.
    ///
    /// # Errors
    ///
    /// As [`get_config_data`](Self::get_config_data), plus `LookupError`.
    pub fn get_value(&self, name: &str, path: &str) -> Result<DocumentNode> {
        let document = self.validated_document(name, "read data of")?;
        Ok(export::get_value(&document, path)?.clone())
    }

    /// String at `path`.
    ///
    /// # Errors
    ///
    /// As [`get_value`](Self::get_value), plus `TypeMismatch`.
    pub fn get_str(&self, name: &str, path: &str) -> Result<String> {
        let document = self.validated_document(name, "read data of")?;
        Ok(export::get_str(&document, path)?.to_string())
    }

    /// Integer at `path`.
    ///
    /// # Errors
    ///
    /// As [`get_value`](Self::get_value), plus `TypeMismatch`.
    pub fn get_i64(&self, name: &str, path: &str) -> Result<i64> {
        let document = self.validated_document(name, "read data of")?;
        Ok(export::get_i64(&document, path)?)
    }

    /// Boolean at `path`.
    ///
    /// # Errors
    ///
    /// As [`get_value`](Self::get_value), plus `TypeMismatch`.
    pub fn get_bool(&self, name: &str, path: &str) -> Result<bool> {
        let document = self.validated_document(name, "read data of")?;
        Ok(export::get_bool(&document, path)?)
    }

    /// The merged document as YAML.
    ///
    /// # Errors
    ///
    /// As [`get_config_data`](Self::get_config_data), plus emitter failures.
    pub fn write_yaml(&self, name: &str) -> Result<String> {
        let document = self.validated_document(name, "export")?;
        Ok(export::to_yaml(&document)?)
    }

    /// The merged document as JSON.
    ///
    /// # Errors
    ///
    /// As [`get_config_data`](Self::get_config_data), plus emitter failures.
    pub fn write_json(&self, name: &str, pretty: bool) -> Result<String> {
        let document = self.validated_document(name, "export")?;
        Ok(export::to_json(&document, pretty)?)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn validated_document(&self, name: &str, operation: &'static str) -> Result<Arc<DocumentNode>> {
        let cfg = self.require(name, operation, LifecycleState::Registered)?;
        let Some(merged) = &cfg.merged else {
            return Err(SerializationError::NoDocument(name.to_string()).into());
        };
        if cfg.report.is_none() {
            return Err(UsageError::OutOfOrder {
                name: name.to_string(),
                operation,
                state: cfg.state(),
            }
            .into());
        }
        Ok(Arc::clone(merged))
    }

    /// Looks up `name` and checks it has reached `required`. The returned
    /// guard holds a shard read lock; drop it before doing I/O.
    fn require(
        &self,
        name: &str,
        operation: &'static str,
        required: LifecycleState,
    ) -> Result<dashmap::mapref::one::Ref<'_, String, NamedConfiguration>> {
        let Some(cfg) = self.configs.get(name) else {
            return Err(self.unknown(name));
        };
        let state = cfg.state();
        if !state.reached(required) {
            tracing::warn!(name, %state, operation, "operation out of order");
            return Err(UsageError::OutOfOrder {
                name: name.to_string(),
                operation,
                state,
            }
            .into());
        }
        Ok(cfg)
    }

    fn commit(&self, name: &str, update: impl FnOnce(&mut NamedConfiguration)) -> Result<()> {
        let Some(mut cfg) = self.configs.get_mut(name) else {
            return Err(self.unknown(name));
        };
        update(&mut cfg);
        Ok(())
    }

    fn unknown(&self, name: &str) -> ConfigMgrError {
        let suggestion = self
            .configs
            .iter()
            .map(|e| (strsim::jaro_winkler(name, e.key()), e.key().clone()))
            .filter(|(score, _)| *score > 0.8)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, candidate)| candidate);
        tracing::warn!(name, "unknown configuration name");
        UsageError::UnknownName {
            name: name.to_string(),
            suggestion,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LookupError, SchemaError};
    use crate::source::MemoryReader;

    const SCHEMA: &str = r#"{
        "type": "object",
        "required": ["listenerPort"],
        "properties": {"listenerPort": {"type": "integer"}, "tags": {"type": "array"}}
    }"#;

    fn manager(reader: MemoryReader) -> ConfigManager {
        ConfigManager::with_reader(
            Arc::new(reader),
            ManagerOptions {
                merge: MergeOptions::default(),
                source_limits: SourceLimits {
                    max_source_size: 1 << 16,
                },
                max_validation_depth: DEFAULT_MAX_VALIDATION_DEPTH,
            },
        )
    }

    fn reader() -> MemoryReader {
        MemoryReader::new()
            .with_file("base.json", SCHEMA)
            .with_file("app.json", r#"{"listenerPort": 8080, "tags": ["a", "b"]}"#)
            .with_file("override.yaml", "listenerPort: 9090\ntags: [c]\n")
            .with_file("bad.yaml", "listenerPort: [unclosed\n")
    }

    fn loaded(m: &ConfigManager, sources: &str) {
        m.add_config("cfg").unwrap();
        m.set_config_path("cfg", sources).unwrap();
        m.load_schemas("cfg", "base.json").unwrap();
        m.load_configuration("cfg").unwrap();
    }

    fn usage(result: Result<impl std::fmt::Debug>) -> UsageError {
        match result {
            Err(ConfigMgrError::Usage(e)) => e,
            other => panic!("expected usage error, got {other:?}"),
        }
    }

    #[test]
    fn test_happy_path() {
        let m = manager(reader());
        loaded(&m, "FILE(app.json)");
        let report = m.validate("cfg").unwrap();
        assert!(report.ok());
        assert!(report.is_valid());
        assert_eq!(m.state("cfg").unwrap(), LifecycleState::Validated { valid: true });
        let data = m.get_config_data("cfg").unwrap();
        assert_eq!(data["listenerPort"], DocumentNode::Integer(8080));
    }

    #[test]
    fn test_overlay_order() {
        let m = manager(reader());
        loaded(&m, "app.json:override.yaml");
        m.validate("cfg").unwrap();
        assert_eq!(m.get_i64("cfg", "listenerPort").unwrap(), 9090);
        assert_eq!(m.get_str("cfg", "/tags/0").unwrap(), "c");
    }

    #[test]
    fn test_concatenate_option() {
        let m = ConfigManager::with_reader(
            Arc::new(reader()),
            ManagerOptions {
                merge: MergeOptions::concatenate(),
                ..manager(MemoryReader::new()).options
            },
        );
        loaded(&m, "app.json:override.yaml");
        m.validate("cfg").unwrap();
        let tags = m.get_value("cfg", "tags").unwrap();
        assert_eq!(tags.as_sequence().map(<[_]>::len), Some(3));
    }

    #[test]
    fn test_duplicate_and_empty_names() {
        let m = manager(reader());
        m.add_config("cfg").unwrap();
        assert!(matches!(m.add_config("cfg"), Err(ConfigMgrError::DuplicateName(_))));
        assert!(matches!(usage(m.add_config("")), UsageError::EmptyName));
    }

    #[test]
    fn test_unknown_name_suggests() {
        let m = manager(reader());
        m.add_config("gateway").unwrap();
        match usage(m.state("gatewy")) {
            UsageError::UnknownName { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("gateway"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_order_calls() {
        let m = manager(reader());
        m.add_config("cfg").unwrap();
        assert!(matches!(
            usage(m.load_schemas("cfg", "base.json")),
            UsageError::OutOfOrder { state: LifecycleState::Registered, .. }
        ));
        m.set_config_path("cfg", "app.json").unwrap();
        assert!(matches!(
            usage(m.load_configuration("cfg")),
            UsageError::OutOfOrder { state: LifecycleState::PathSet, .. }
        ));
        m.load_schemas("cfg", "base.json").unwrap();
        assert!(matches!(
            usage(m.validate("cfg")),
            UsageError::OutOfOrder { state: LifecycleState::SchemasLoaded, .. }
        ));
        assert!(matches!(
            m.write_yaml("cfg"),
            Err(ConfigMgrError::Serialization(SerializationError::NoDocument(_)))
        ));
        m.load_configuration("cfg").unwrap();
        assert!(matches!(
            usage(m.get_config_data("cfg")),
            UsageError::OutOfOrder { state: LifecycleState::ConfigurationLoaded, .. }
        ));
    }

    #[test]
    fn test_failed_load_keeps_previous_document() {
        let m = manager(reader());
        loaded(&m, "app.json");
        m.validate("cfg").unwrap();
        m.set_config_path("cfg", "app.json:bad.yaml").unwrap();
        assert!(matches!(
            m.load_configuration("cfg"),
            Err(ConfigMgrError::Source(SourceError::Parse { .. }))
        ));
        assert_eq!(m.state("cfg").unwrap(), LifecycleState::SchemasLoaded);
    }

    #[test]
    fn test_failed_schema_load_keeps_graph() {
        let m = manager(reader().with_file("broken.json", r##"{"$ref": "#/nowhere"}"##));
        loaded(&m, "app.json");
        assert!(matches!(
            m.load_schemas("cfg", "broken.json"),
            Err(ConfigMgrError::Schema(SchemaError::UnresolvedReference { .. }))
        ));
        assert_eq!(m.state("cfg").unwrap(), LifecycleState::ConfigurationLoaded);
        assert!(m.validate("cfg").unwrap().is_valid());
    }

    #[test]
    fn test_invalid_document_still_readable() {
        let m = manager(reader().with_file("noport.json", r#"{"tags": []}"#));
        loaded(&m, "noport.json");
        let report = m.validate("cfg").unwrap();
        assert_eq!(report.exception_count(), 1);
        assert_eq!(m.state("cfg").unwrap(), LifecycleState::Validated { valid: false });
        assert!(m.write_yaml("cfg").unwrap().contains("tags: []"));
        assert_eq!(m.validation_report("cfg").unwrap(), Some(report));
    }

    #[test]
    fn test_lookup_errors_surface() {
        let m = manager(reader());
        loaded(&m, "app.json");
        m.validate("cfg").unwrap();
        assert!(matches!(
            m.get_value("cfg", "missing"),
            Err(ConfigMgrError::Lookup(LookupError::MissingKey { .. }))
        ));
        assert!(matches!(
            m.get_bool("cfg", "listenerPort"),
            Err(ConfigMgrError::Lookup(LookupError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_remove_and_names() {
        let m = manager(reader());
        m.add_config("b").unwrap();
        m.add_config("a").unwrap();
        assert_eq!(m.names(), vec!["a", "b"]);
        m.remove_config("a").unwrap();
        assert!(m.remove_config("a").is_err());
        assert_eq!(m.names(), vec!["b"]);
    }

    #[test]
    fn test_invalid_locator_leaves_entry_unchanged() {
        let m = manager(reader());
        m.add_config("cfg").unwrap();
        m.set_config_path("cfg", "app.json").unwrap();
        assert!(matches!(
            m.set_config_path("cfg", "a::b"),
            Err(ConfigMgrError::Source(SourceError::InvalidLocator { .. }))
        ));
        assert_eq!(m.state("cfg").unwrap(), LifecycleState::PathSet);
    }

    #[test]
    fn test_manager_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConfigManager>();
    }
}
