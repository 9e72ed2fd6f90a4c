//! Shell-glob pattern sets for include and exclude decisions.
//!
//! Candidates are either bare entry names or relative paths joined with `/`.
//! `*` is allowed to cross separators, so `*.log` matches `a/b.log` too.

use std::collections::HashSet;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use super::error::CoreError;

/// A compiled, immutable set of glob patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    set: GlobSet,
    len: usize,
}

impl PatternSet {
    /// Compiles `patterns` into a single `GlobSet`.
    ///
    /// Blank lines and `#` comments are skipped. The first malformed pattern
    /// aborts compilation so bad configuration is reported before any traversal.
    pub fn new<I, S>(patterns: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut len = 0;

        for pattern in patterns {
            let trimmed = pattern.as_ref().trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let glob = GlobBuilder::new(trimmed)
                .literal_separator(false)
                .case_insensitive(false)
                .backslash_escape(true)
                .build()?;
            builder.add(glob);
            len += 1;
        }

        Ok(Self {
            set: builder.build()?,
            len,
        })
    }

    /// An empty set, which matches nothing.
    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
            len: 0,
        }
    }

    /// Returns `true` if `candidate` matches at least one pattern in full.
    pub fn matches(&self, candidate: &str) -> bool {
        self.len > 0 && self.set.is_match(candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

/// The include and exclude sets of one materialization, with the two
/// derived predicates the builder and scanner share.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    include: PatternSet,
    exclude: PatternSet,
}

impl PatternMatcher {
    pub fn new(include: PatternSet, exclude: PatternSet) -> Self {
        Self { include, exclude }
    }

    /// Compiles both pattern lists, reporting the first invalid pattern.
    pub fn from_patterns(
        include: &HashSet<String>,
        exclude: &HashSet<String>,
    ) -> Result<Self, CoreError> {
        Ok(Self::new(PatternSet::new(include)?, PatternSet::new(exclude)?))
    }

    /// Exclusion is decided on the bare entry name.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.matches(name)
    }

    /// An empty include set places no restriction on `rel_path`.
    pub fn is_include_eligible(&self, rel_path: &str) -> bool {
        self.include.is_empty() || self.include.matches(rel_path)
    }

    /// `true` when an include set is configured and `rel_path` matches it.
    pub fn matches_include(&self, rel_path: &str) -> bool {
        self.include.matches(rel_path)
    }

    pub fn has_includes(&self) -> bool {
        !self.include.is_empty()
    }
}
