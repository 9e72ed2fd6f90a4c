pub mod error;
pub mod patterns;
pub mod scanner;
pub mod serializer;
pub mod sort;
pub mod tree_builder;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The kind of a materialized entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry of a materialized tree.
///
/// `children` is `Some` exactly for directories, even when empty, and is
/// omitted from the JSON form of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl Node {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            children: None,
        }
    }

    pub fn directory(name: impl Into<String>, path: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            children: Some(children),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// The children of a directory; always empty for files.
    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Counts `(directories, files)` in this subtree, including `self`.
    pub fn count(&self) -> (usize, usize) {
        let own = if self.is_directory() { (1, 0) } else { (0, 1) };
        self.children().iter().fold(own, |(dirs, files), child| {
            let (d, f) = child.count();
            (dirs + d, files + f)
        })
    }

    /// Finds a descendant by its `/`-separated path relative to this node.
    pub fn find(&self, rel_path: &str) -> Option<&Node> {
        rel_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| {
                node.children().iter().find(|child| child.name == segment)
            })
    }
}

/// Per-call configuration of a materialization.
///
/// Nothing here is global: two runs with different options never interact.
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Globs over root-relative paths; empty means "no restriction".
    pub include_patterns: HashSet<String>,
    /// Globs over bare entry names.
    pub exclude_patterns: HashSet<String>,
    /// Name of the directory whose subtree gets the marker orderings.
    pub marker: Option<String>,
    pub sort_policy: sort::SortPolicy,
}

pub use error::CoreError;
pub use patterns::{PatternMatcher, PatternSet};
pub use scanner::DescendantScanner;
pub use serializer::TreeSerializer;
pub use sort::{
    DefaultOrder, DirectoryClass, DirectoryClassifier, EntryInfo, MarkerClassifier, NestedOrder,
    SortPolicy,
};
pub use tree_builder::{materialize, TreeBuilder};
