use std::path::Path;

use walkdir::WalkDir;

use super::patterns::PatternMatcher;

/// Answers "is there anything worth keeping below this directory?" by
/// walking the whole subtree.
///
/// Every call is a fresh walk. A pass-through chain of `n` ancestors may walk
/// the same subtree `n` times; trees of a few thousand entries keep this cheap.
pub struct DescendantScanner<'a> {
    matcher: &'a PatternMatcher,
}

impl<'a> DescendantScanner<'a> {
    pub fn new(matcher: &'a PatternMatcher) -> Self {
        Self { matcher }
    }

    /// Returns `true` on the first descendant of `dir_path` (file or directory)
    /// whose path relative to the traversal root is include-eligible.
    ///
    /// `rel_path` is the relative path of `dir_path` itself. Unreadable
    /// directories anywhere in the subtree simply contribute nothing.
    pub fn has_includable_descendant(&self, dir_path: &Path, rel_path: &str) -> bool {
        for entry in WalkDir::new(dir_path).min_depth(1).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::trace!("Skipping unreadable entry under {:?}: {}", dir_path, e);
                    continue;
                }
            };

            let Ok(suffix) = entry.path().strip_prefix(dir_path) else {
                continue;
            };
            let descendant_rel = join_relative(rel_path, suffix);

            if self.matcher.is_include_eligible(&descendant_rel) {
                tracing::trace!("Found includable descendant {}", descendant_rel);
                return true;
            }
        }

        false
    }
}

/// Joins `suffix` onto `base` with `/`, whatever the host separator is.
fn join_relative(base: &str, suffix: &Path) -> String {
    let mut rel = base.to_string();
    for component in suffix.components() {
        if !rel.is_empty() {
            rel.push('/');
        }
        rel.push_str(&component.as_os_str().to_string_lossy());
    }
    rel
}
