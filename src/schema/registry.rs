use crate::error::SchemaError;
use crate::observability::metrics;
use crate::source::{LoadedSource, SourceLoader};

use super::compile::{SchemaDocument, compose};
use super::model::SchemaGraph;

/// Loads schema locator lists and composes them into graphs.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    loader: SourceLoader,
}

impl SchemaRegistry {
    /// Creates a registry that reads through `loader`.
    #[must_use]
    pub const fn new(loader: SourceLoader) -> Self {
        Self { loader }
    }

    /// Loads every document of a `:`-separated schema locator list and
    /// composes them. The first document is the root.
    ///
    /// # Errors
    ///
    /// Source failures are wrapped in [`SchemaError::Source`]; composition
    /// failures are returned as-is.
    pub fn load_schemas(&self, locators: &str) -> Result<SchemaGraph, SchemaError> {
        let result = self
            .loader
            .load_list(locators)
            .map_err(SchemaError::from)
            .and_then(|sources| {
                let documents: Vec<SchemaDocument> =
                    sources.into_iter().map(SchemaDocument::from).collect();
                compose(&documents)
            });
        metrics::record_schema_composition(result.is_ok());
        match &result {
            Ok(graph) => tracing::info!(
                documents = graph.documents().len(),
                schemas = graph.len(),
                "composed schema set"
            ),
            Err(e) => tracing::debug!(error = %e, "schema composition failed"),
        }
        result
    }
}

impl From<LoadedSource> for SchemaDocument {
    fn from(source: LoadedSource) -> Self {
        Self::new(source.path, source.document)
    }
}
