pub mod settings;

use crate::core::{DefaultOrder, NestedOrder, SortPolicy, TreeOptions};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Sorted so that saved configuration files are stable.
    pub include_patterns: BTreeSet<String>,
    pub exclude_patterns: BTreeSet<String>,
    pub marker: Option<String>,
    pub nested_order: NestedOrder,
    pub default_order: DefaultOrder,
    pub root_directory: Option<PathBuf>,
    pub output_file: PathBuf,
    pub pretty_json: bool,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        settings::load_config(path)
    }

    /// The per-run materialization options described by this configuration.
    pub fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            include_patterns: self.include_patterns.iter().cloned().collect(),
            exclude_patterns: self.exclude_patterns.iter().cloned().collect(),
            marker: self.marker.clone(),
            sort_policy: SortPolicy {
                nested: self.nested_order,
                default: self.default_order,
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let exclude_patterns = [".git", "node_modules", "tree-view-app"]
            .into_iter()
            .map(String::from)
            .collect();

        Self {
            include_patterns: BTreeSet::new(),
            exclude_patterns,
            marker: Some("MENU".to_string()),
            nested_order: NestedOrder::default(),
            default_order: DefaultOrder::default(),
            root_directory: None,
            output_file: PathBuf::from("tree-data.json"),
            pretty_json: true,
        }
    }
}
