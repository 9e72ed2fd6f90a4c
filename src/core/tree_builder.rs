//! Materializes a filtered, ordered tree from a directory on disk.

use std::fs;
use std::path::Path;
use std::time::Instant;

use super::patterns::PatternMatcher;
use super::scanner::DescendantScanner;
use super::sort::{DirectoryClassifier, EntryInfo, MarkerClassifier, SortPolicy};
use super::{CoreError, Node, TreeOptions};

/// Builds the output tree for one traversal root.
///
/// A builder owns its compiled patterns and can be reused for any number of
/// roots; it keeps no state between `build` calls.
pub struct TreeBuilder<C = MarkerClassifier> {
    matcher: PatternMatcher,
    sort_policy: SortPolicy,
    classifier: C,
}

impl TreeBuilder<MarkerClassifier> {
    /// Compiles the pattern sets of `options`. Invalid globs fail here,
    /// before anything is read from disk.
    pub fn from_options(options: &TreeOptions) -> Result<Self, CoreError> {
        let matcher =
            PatternMatcher::from_patterns(&options.include_patterns, &options.exclude_patterns)?;
        Ok(Self::new(
            matcher,
            options.sort_policy.clone(),
            MarkerClassifier::new(options.marker.clone()),
        ))
    }
}

impl<C: DirectoryClassifier> TreeBuilder<C> {
    pub fn new(matcher: PatternMatcher, sort_policy: SortPolicy, classifier: C) -> Self {
        Self {
            matcher,
            sort_policy,
            classifier,
        }
    }

    /// Builds the tree rooted at `root`.
    ///
    /// The root is always a directory node, whatever the patterns say. An
    /// unreadable root yields a directory node without children.
    pub fn build(&self, root: &Path) -> Node {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.to_string_lossy().to_string());

        Node::directory(
            name,
            root.to_string_lossy(),
            self.build_children(root, "", false),
        )
    }

    /// Resolves the surviving children of `dir`, in sort-policy order.
    ///
    /// `rel_path` is `dir` relative to the traversal root (empty for the
    /// root), and `in_included` is set once an ancestor matched the include set.
    fn build_children(&self, dir: &Path, rel_path: &str, in_included: bool) -> Vec<Node> {
        let entries = match read_entries(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("{}; emitting the directory without children", e);
                return Vec::new();
            }
        };

        let scanner = DescendantScanner::new(&self.matcher);
        let ordered = self
            .sort_policy
            .order(self.classifier.classify(dir), entries);
        let mut children = Vec::with_capacity(ordered.len());

        for entry in ordered {
            let entry_rel = if rel_path.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", rel_path, entry.name)
            };

            if self.matcher.is_excluded(&entry.name) {
                let pass_through = entry.is_dir
                    && self.matcher.has_includes()
                    && scanner.has_includable_descendant(&entry.path, &entry_rel);
                if !pass_through {
                    tracing::debug!("Excluded {}", entry_rel);
                    continue;
                }
                tracing::debug!("Keeping excluded {} as a pass-through directory", entry_rel);
            }

            let in_subtree = in_included || self.matcher.matches_include(&entry_rel);

            if !in_subtree && self.matcher.has_includes() {
                let keep =
                    entry.is_dir && scanner.has_includable_descendant(&entry.path, &entry_rel);
                if !keep {
                    tracing::debug!("Pruned {}", entry_rel);
                    continue;
                }
            }

            let path = entry.path.to_string_lossy().to_string();
            if entry.is_dir {
                let grandchildren = self.build_children(&entry.path, &entry_rel, in_subtree);
                children.push(Node::directory(entry.name, path, grandchildren));
            } else {
                children.push(Node::file(entry.name, path));
            }
        }

        children
    }
}

/// Lists `dir` with the metadata the sort policies need.
///
/// Symbolic links are followed, so a link to a directory is listed as a
/// directory. A dangling link is listed by its own file type. Entries that
/// vanish or fail mid-listing are skipped.
pub fn read_entries(dir: &Path) -> Result<Vec<EntryInfo>, CoreError> {
    let read_dir = fs::read_dir(dir).map_err(|e| CoreError::Io(e, dir.to_path_buf()))?;
    let mut entries = Vec::new();

    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                continue;
            }
        };

        let path = entry.path();
        let metadata = fs::metadata(&path).or_else(|_| entry.metadata()).ok();
        let is_dir = match &metadata {
            Some(m) => m.is_dir(),
            None => entry.file_type().is_ok_and(|t| t.is_dir()),
        };

        entries.push(EntryInfo {
            name: entry.file_name().to_string_lossy().to_string(),
            path,
            is_dir,
            created: metadata.as_ref().and_then(|m| m.created().ok()),
            modified: metadata.as_ref().and_then(|m| m.modified().ok()),
        });
    }

    Ok(entries)
}

/// Compiles `options`, checks that `root` is a directory and builds its tree.
///
/// This is the single entry point for one materialization run. The traversal
/// itself never fails; only configuration and the root check can.
pub fn materialize(root: &Path, options: &TreeOptions) -> Result<Node, CoreError> {
    let builder = TreeBuilder::from_options(options)?;

    if !root.is_dir() {
        return Err(CoreError::NotADirectory(root.to_path_buf()));
    }

    let started = Instant::now();
    let tree = builder.build(root);
    let (dirs, files) = tree.count();

    tracing::info!(
        "✅ Materialized {:?}: {} directories, {} files in {:?}",
        root,
        dirs,
        files,
        started.elapsed()
    );

    Ok(tree)
}
