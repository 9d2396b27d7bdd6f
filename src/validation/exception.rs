use std::fmt;

use serde::Serialize;

/// One validity exception, possibly explained by more specific children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationException {
    message: String,
    instance_path: String,
    keyword: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Self>,
}

impl ValidationException {
    /// Creates a leaf exception.
    #[must_use]
    pub fn new(keyword: &'static str, instance_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            instance_path: instance_path.into(),
            keyword,
            children: Vec::new(),
        }
    }

    /// Attaches child exceptions.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }

    /// Human-readable description, including the instance path.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// JSON pointer of the offending value (`""` is the document root).
    #[must_use]
    pub fn instance_path(&self) -> &str {
        &self.instance_path
    }

    /// Schema keyword that failed.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        self.keyword
    }

    /// More specific causes, in discovery order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Returns `true` if this exception has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaves below (and including) this node.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(Self::leaf_count).sum()
        }
    }

    /// Depth-first, pre-order traversal.
    pub fn iter(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }

    /// Leaf exceptions in traversal order.
    pub fn leaves(&self) -> impl Iterator<Item = &Self> {
        self.iter().filter(|e| e.is_leaf())
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{}", "", self.message, indent = depth * 2)?;
        for child in &self.children {
            child.render(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ValidationException {
    /// Renders the tree, one exception per line, children indented.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}
