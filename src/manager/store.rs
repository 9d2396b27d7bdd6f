//! Per-name configuration storage.

use std::fmt;
use std::sync::Arc;

use crate::document::DocumentNode;
use crate::schema::SchemaGraph;
use crate::source::SourceLocator;
use crate::validation::ValidationReport;

/// Where a named configuration is in its lifecycle.
///
/// Derived from which artifacts are stored; never stored itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Name added, nothing else.
    Registered,
    /// Source locators set.
    PathSet,
    /// Schema graph composed and installed.
    SchemasLoaded,
    /// Sources loaded and merged.
    ConfigurationLoaded,
    /// Validation ran to completion.
    Validated {
        /// Whether the merged document conforms.
        valid: bool,
    },
}

impl LifecycleState {
    /// Position in the lifecycle; later states rank higher.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Registered => 0,
            Self::PathSet => 1,
            Self::SchemasLoaded => 2,
            Self::ConfigurationLoaded => 3,
            Self::Validated { .. } => 4,
        }
    }

    /// Returns `true` if this state is `other` or later.
    #[must_use]
    pub const fn reached(self, other: Self) -> bool {
        self.rank() >= other.rank()
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Registered => "Registered",
            Self::PathSet => "PathSet",
            Self::SchemasLoaded => "SchemasLoaded",
            Self::ConfigurationLoaded => "ConfigurationLoaded",
            Self::Validated { .. } => "Validated",
        })
    }
}

/// Everything stored for one configuration name.
#[derive(Debug, Clone, Default)]
pub struct NamedConfiguration {
    pub(crate) source_locators: Vec<SourceLocator>,
    pub(crate) schema_locators: Vec<SourceLocator>,
    pub(crate) graph: Option<Arc<SchemaGraph>>,
    pub(crate) merged: Option<Arc<DocumentNode>>,
    pub(crate) report: Option<ValidationReport>,
}

impl NamedConfiguration {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        if let Some(report) = &self.report {
            LifecycleState::Validated {
                valid: report.is_valid(),
            }
        } else if self.merged.is_some() {
            LifecycleState::ConfigurationLoaded
        } else if self.graph.is_some() {
            LifecycleState::SchemasLoaded
        } else if !self.source_locators.is_empty() {
            LifecycleState::PathSet
        } else {
            LifecycleState::Registered
        }
    }

    /// Source locators, in overlay order.
    #[must_use]
    pub fn source_locators(&self) -> &[SourceLocator] {
        &self.source_locators
    }

    /// Schema locators; the first is the root document.
    #[must_use]
    pub fn schema_locators(&self) -> &[SourceLocator] {
        &self.schema_locators
    }

    /// Replaces the source locators, dropping the merged document and report.
    pub(crate) fn set_sources(&mut self, locators: Vec<SourceLocator>) {
        self.source_locators = locators;
        self.merged = None;
        self.report = None;
    }

    /// Installs a schema graph, dropping the report.
    pub(crate) fn install_graph(&mut self, locators: Vec<SourceLocator>, graph: SchemaGraph) {
        self.schema_locators = locators;
        self.graph = Some(Arc::new(graph));
        self.report = None;
    }

    /// Installs a merged document, dropping the report.
    pub(crate) fn install_merged(&mut self, merged: DocumentNode) {
        self.merged = Some(Arc::new(merged));
        self.report = None;
    }
}
