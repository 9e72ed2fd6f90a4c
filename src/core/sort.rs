//! Sibling ordering.
//!
//! Each directory is classified once, and the class picks the ordering rule.
//! Every rule ends in a name tie-break, so the resulting order is total.

use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// One raw entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    /// `None` when the platform or filesystem cannot report it.
    pub created: Option<SystemTime>,
    pub modified: Option<SystemTime>,
}

/// The identity of a directory as far as ordering is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryClass {
    /// The directory is itself the marker directory (e.g. `.../MENU`).
    RootMarker,
    /// The directory lives somewhere beneath a marker directory.
    NestedMarker,
    Default,
}

/// Decides the `DirectoryClass` of a directory path.
pub trait DirectoryClassifier {
    fn classify(&self, dir: &Path) -> DirectoryClass;
}

/// Classifies by looking for a literal marker segment in the path.
#[derive(Debug, Clone, Default)]
pub struct MarkerClassifier {
    marker: Option<String>,
}

impl MarkerClassifier {
    pub fn new(marker: Option<String>) -> Self {
        Self {
            marker: marker.filter(|m| !m.is_empty()),
        }
    }
}

impl DirectoryClassifier for MarkerClassifier {
    fn classify(&self, dir: &Path) -> DirectoryClass {
        let Some(marker) = self.marker.as_deref() else {
            return DirectoryClass::Default;
        };

        let segments: Vec<_> = dir
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s),
                _ => None,
            })
            .collect();

        match segments.split_last() {
            Some((last, _)) if *last == marker => DirectoryClass::RootMarker,
            Some((_, ancestors)) if ancestors.iter().any(|s| *s == marker) => {
                DirectoryClass::NestedMarker
            }
            _ => DirectoryClass::Default,
        }
    }
}

/// Ordering inside directories below a marker directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NestedOrder {
    /// Newest first; entries without a readable time go last.
    #[default]
    ModifiedDesc,
    /// Case-insensitive by name, files and directories mixed.
    Alphabetical,
}

/// Ordering for every directory that is not marker-related.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DefaultOrder {
    /// Directories first, then files, each case-insensitive by name.
    #[default]
    Name,
    /// Directories first, then files, each oldest-modified first.
    ModifiedAsc,
}

/// The complete sibling-ordering configuration of a materialization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortPolicy {
    pub nested: NestedOrder,
    pub default: DefaultOrder,
}

impl SortPolicy {
    /// Orders `entries` according to the rule selected by `class`.
    pub fn order(&self, class: DirectoryClass, mut entries: Vec<EntryInfo>) -> Vec<EntryInfo> {
        match class {
            DirectoryClass::RootMarker => entries.sort_by(|a, b| {
                dirs_first(a, b).then_with(|| {
                    if a.is_dir {
                        time_or_zero(a.created)
                            .cmp(&time_or_zero(b.created))
                            .then_with(|| by_name(a, b))
                    } else {
                        a.name.cmp(&b.name)
                    }
                })
            }),
            DirectoryClass::NestedMarker => match self.nested {
                NestedOrder::ModifiedDesc => entries.sort_by(|a, b| {
                    time_or_zero(b.modified)
                        .cmp(&time_or_zero(a.modified))
                        .then_with(|| by_name(a, b))
                }),
                NestedOrder::Alphabetical => entries.sort_by(by_name),
            },
            DirectoryClass::Default => match self.default {
                DefaultOrder::Name => {
                    entries.sort_by(|a, b| dirs_first(a, b).then_with(|| by_name(a, b)))
                }
                DefaultOrder::ModifiedAsc => entries.sort_by(|a, b| {
                    dirs_first(a, b)
                        .then_with(|| time_or_zero(a.modified).cmp(&time_or_zero(b.modified)))
                        .then_with(|| by_name(a, b))
                }),
            },
        }
        entries
    }
}

fn time_or_zero(time: Option<SystemTime>) -> SystemTime {
    time.unwrap_or(SystemTime::UNIX_EPOCH)
}

fn dirs_first(a: &EntryInfo, b: &EntryInfo) -> Ordering {
    b.is_dir.cmp(&a.is_dir)
}

/// Case-insensitive, then exact, so names differing only in case stay ordered.
fn by_name(a: &EntryInfo, b: &EntryInfo) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn at(secs: u64) -> Option<SystemTime> {
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn dir(name: &str, created: Option<SystemTime>, modified: Option<SystemTime>) -> EntryInfo {
        EntryInfo {
            name: name.to_string(),
            path: PathBuf::from(name),
            is_dir: true,
            created,
            modified,
        }
    }

    fn file(name: &str, modified: Option<SystemTime>) -> EntryInfo {
        EntryInfo {
            is_dir: false,
            ..dir(name, None, modified)
        }
    }

    fn names(entries: &[EntryInfo]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn classifier_distinguishes_marker_positions() {
        let classifier = MarkerClassifier::new(Some("MENU".to_string()));
        assert_eq!(
            classifier.classify(Path::new("/app/public/MENU")),
            DirectoryClass::RootMarker
        );
        assert_eq!(
            classifier.classify(Path::new("/app/public/MENU/Shooting/PAGE_1")),
            DirectoryClass::NestedMarker
        );
        assert_eq!(
            classifier.classify(Path::new("/app/public/MENUS")),
            DirectoryClass::Default
        );
        assert_eq!(classifier.classify(Path::new("/app/src")), DirectoryClass::Default);
    }

    #[test]
    fn classifier_without_marker_is_always_default() {
        let classifier = MarkerClassifier::new(None);
        assert_eq!(classifier.classify(Path::new("/x/MENU")), DirectoryClass::Default);
        let classifier = MarkerClassifier::new(Some(String::new()));
        assert_eq!(classifier.classify(Path::new("/x/MENU")), DirectoryClass::Default);
    }

    #[test]
    fn root_marker_orders_dirs_by_creation_then_files_by_exact_name() {
        let entries = vec![
            file("b.txt", at(1)),
            dir("Shooting", at(30), at(1)),
            file("B.txt", at(1)),
            dir("Playback", at(10), at(1)),
            dir("Setup", None, at(1)),
            file("a.txt", at(1)),
        ];
        let ordered = SortPolicy::default().order(DirectoryClass::RootMarker, entries);
        assert_eq!(
            names(&ordered),
            vec!["Setup", "Playback", "Shooting", "B.txt", "a.txt", "b.txt"]
        );
    }

    #[test]
    fn nested_marker_modified_desc_puts_unknown_times_last() {
        let entries = vec![
            file("old.png", at(5)),
            dir("unknown", None, None),
            dir("new", None, at(50)),
            file("mid.json", at(20)),
        ];
        let ordered = SortPolicy::default().order(DirectoryClass::NestedMarker, entries);
        assert_eq!(names(&ordered), vec!["new", "mid.json", "old.png", "unknown"]);
    }

    #[test]
    fn nested_marker_alphabetical_mixes_files_and_dirs() {
        let policy = SortPolicy {
            nested: NestedOrder::Alphabetical,
            ..Default::default()
        };
        let entries = vec![file("b", None), dir("C", None, None), file("a", None)];
        let ordered = policy.order(DirectoryClass::NestedMarker, entries);
        assert_eq!(names(&ordered), vec!["a", "b", "C"]);
    }

    #[test]
    fn default_name_order_groups_dirs_first_case_insensitive() {
        let entries = vec![
            file("readme.md", None),
            dir("src", None, None),
            file("Cargo.toml", None),
            dir("Docs", None, None),
        ];
        let ordered = SortPolicy::default().order(DirectoryClass::Default, entries);
        assert_eq!(names(&ordered), vec!["Docs", "src", "Cargo.toml", "readme.md"]);
    }

    #[test]
    fn default_modified_asc_keeps_dirs_before_files() {
        let policy = SortPolicy {
            default: DefaultOrder::ModifiedAsc,
            ..Default::default()
        };
        let entries = vec![
            file("first.txt", at(1)),
            dir("late", None, at(100)),
            dir("early", None, at(10)),
            file("second.txt", at(2)),
        ];
        let ordered = policy.order(DirectoryClass::Default, entries);
        assert_eq!(names(&ordered), vec!["early", "late", "first.txt", "second.txt"]);
    }

    #[test]
    fn equal_times_fall_back_to_names() {
        let entries = vec![
            dir("b", at(7), at(7)),
            dir("A", at(7), at(7)),
            dir("a", at(7), at(7)),
        ];
        let ordered = SortPolicy::default().order(DirectoryClass::NestedMarker, entries.clone());
        assert_eq!(names(&ordered), vec!["A", "a", "b"]);
        let ordered = SortPolicy::default().order(DirectoryClass::RootMarker, entries);
        assert_eq!(names(&ordered), vec!["A", "a", "b"]);
    }

    /// Listings never contain the same name twice.
    fn arb_listing() -> impl Strategy<Value = Vec<EntryInfo>> {
        proptest::collection::hash_map(
            "[a-cA-C]{1,3}",
            (
                any::<bool>(),
                proptest::option::of(0u64..4),
                proptest::option::of(0u64..4),
            ),
            0..12,
        )
        .prop_map(|listing| {
            listing
                .into_iter()
                .map(|(name, (is_dir, created, modified))| EntryInfo {
                    path: PathBuf::from(&name),
                    name,
                    is_dir,
                    created: created.and_then(at),
                    modified: modified.and_then(at),
                })
                .collect()
        })
    }

    fn arb_class() -> impl Strategy<Value = DirectoryClass> {
        prop_oneof![
            Just(DirectoryClass::RootMarker),
            Just(DirectoryClass::NestedMarker),
            Just(DirectoryClass::Default),
        ]
    }

    proptest! {
        #[test]
        fn order_does_not_depend_on_listing_order(
            entries in arb_listing(),
            class in arb_class(),
            nested_alpha in any::<bool>(),
            default_mtime in any::<bool>(),
        ) {
            let policy = SortPolicy {
                nested: if nested_alpha { NestedOrder::Alphabetical } else { NestedOrder::ModifiedDesc },
                default: if default_mtime { DefaultOrder::ModifiedAsc } else { DefaultOrder::Name },
            };
            let mut reversed = entries.clone();
            reversed.reverse();

            let forward = policy.order(class, entries);
            let backward = policy.order(class, reversed);
            prop_assert_eq!(forward, backward);
        }
    }
}
