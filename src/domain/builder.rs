//! Reconstructs an outline tree from a flat sequence of items
//!
//! The source rows carry no parent pointers. Structure is recovered from
//! arrival order, each item's level and whether it is a heading:
//!
//! - a deeper item becomes a child of the current node
//! - a heading at the current depth closes the current section and opens a
//!   sibling
//! - a leaf at the current depth is attached under the current heading,
//!   which stays current
//! - a shallower heading becomes a sibling of the current node's ancestor at
//!   that level, in a single step however many levels are closed
//!
//! A leaf can only hang below a heading. A shallower leaf, or one that
//! arrives before any heading, has no owner and is rejected.
//!
//! A row that cannot be placed is logged and skipped. It never aborts the
//! build and never moves the current node.

use std::cmp::Ordering;

use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

use crate::domain::{
    address::Error as AddressError,
    tree::{NodeId, OutlineTree, TreeError},
    OutlineItem,
};

/// Why a row was left out of the tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// The hierarchy cell does not parse.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// No node on the current path sits at the level the row needs.
    #[error("no ancestor to attach an item at level {level} to: {source}")]
    Ancestor {
        /// Level of the rejected row.
        level: usize,
        /// The failed lookup.
        #[source]
        source: TreeError,
    },

    /// A non-heading item arrived shallower than the current section.
    #[error("non-heading item at level {level} sits above the current section at depth {depth}")]
    LeafAboveSection {
        /// Level of the rejected row.
        level: usize,
        /// Depth of the node the row followed.
        depth: usize,
    },

    /// A non-heading item arrived before any heading.
    #[error("non-heading item at level {level} has no heading to belong to")]
    LeafWithoutHeading {
        /// Level of the rejected row.
        level: usize,
    },
}

/// A row the builder could not place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Provenance of the row.
    pub source: String,
    /// The hierarchy cell as it appeared in the row.
    pub section: String,
    /// What went wrong.
    pub error: BuildError,
}

/// The result of a build: the tree, and the rows that did not make it in.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The reconstructed outline.
    pub tree: OutlineTree,
    /// Rows skipped because they could not be placed, in input order.
    pub skipped: Vec<SkippedRow>,
}

/// Incrementally builds an [`OutlineTree`] from items in document order.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: OutlineTree,
    current: NodeId,
    skipped: Vec<SkippedRow>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self {
            tree: OutlineTree::new(),
            current: NodeId::ROOT,
            skipped: Vec::new(),
        }
    }
}

impl TreeBuilder {
    /// Creates a builder with an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder expecting roughly `capacity` items.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: OutlineTree::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// The most recently attached node that later rows are placed relative
    /// to. Leaves attached at the current depth do not move it.
    #[must_use]
    pub const fn current(&self) -> NodeId {
        self.current
    }

    /// Attaches the next item.
    ///
    /// # Errors
    ///
    /// Returns the reason the item could not be placed. The item is then
    /// recorded as skipped and the builder carries on as if it had never
    /// been seen.
    pub fn push(&mut self, item: OutlineItem) -> Result<NodeId, BuildError> {
        match self.placement(&item) {
            Ok((parent, advance)) => {
                trace!(section = item.section(), parent = parent.index(), "attaching");
                let id = self.tree.add_child(parent, item);
                if advance {
                    self.current = id;
                }
                Ok(id)
            }
            Err(error) => {
                warn!(
                    source = item.source(),
                    section = item.section(),
                    "skipping row: {error}"
                );
                self.skipped.push(SkippedRow {
                    source: item.source().to_string(),
                    section: item.section().to_string(),
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Finishes the build.
    #[must_use]
    pub fn finish(self) -> BuildOutcome {
        debug!(
            nodes = self.tree.len(),
            skipped = self.skipped.len(),
            "outline tree built"
        );
        BuildOutcome {
            tree: self.tree,
            skipped: self.skipped,
        }
    }

    /// Where `item` goes: the node to attach it to, and whether it becomes
    /// the new current node.
    fn placement(&self, item: &OutlineItem) -> Result<(NodeId, bool), BuildError> {
        if let Some(error) = item.address_error() {
            return Err(error.clone().into());
        }

        let level = item.level();
        let current = self.tree.at(self.current);

        let (parent, advance) = match level.cmp(&current.depth()) {
            Ordering::Greater => (current.id(), true),
            Ordering::Equal if item.is_heading() => {
                let parent = current.parent().map_or(NodeId::ROOT, |parent| parent.id());
                (parent, true)
            }
            Ordering::Equal => (current.id(), false),
            Ordering::Less if !item.is_heading() => {
                return Err(BuildError::LeafAboveSection {
                    level,
                    depth: current.depth(),
                });
            }
            Ordering::Less => {
                let ancestor = current
                    .ancestor_at_depth(level)
                    .map_err(|source| BuildError::Ancestor { level, source })?;
                // valid addresses have level >= 1, so the ancestor is never the root
                let parent = ancestor.parent().map_or(NodeId::ROOT, |parent| parent.id());
                (parent, true)
            }
        };

        if parent == NodeId::ROOT && !item.is_heading() {
            return Err(BuildError::LeafWithoutHeading { level });
        }
        Ok((parent, advance))
    }
}

/// Builds a tree from items in document order.
#[must_use]
#[instrument(level = "debug", skip_all)]
pub fn build_tree(items: impl IntoIterator<Item = OutlineItem>) -> BuildOutcome {
    let items = items.into_iter();
    let mut builder = TreeBuilder::with_capacity(items.size_hint().0);
    for item in items {
        // failures are recorded in the skip list
        let _ = builder.push(item);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactKind, ArtifactKind::*};

    fn items(rows: &[(&str, ArtifactKind)]) -> Vec<OutlineItem> {
        rows.iter()
            .enumerate()
            .map(|(i, (section, kind))| {
                OutlineItem::new(*kind, *section, "").with_source(format!("row {}", i + 1))
            })
            .collect()
    }

    fn sections(tree: &OutlineTree) -> String {
        tree.render(|node| node.item().unwrap().section().to_string())
    }

    #[test]
    fn canonical_outline() {
        let outcome = build_tree(items(&[
            ("1", Heading),
            ("1.1", Heading),
            ("1.1-1", Requirement),
            ("1.1-2", Requirement),
            ("1.2", Heading),
            ("1.2-1", Requirement),
        ]));

        assert!(outcome.skipped.is_empty());
        assert_eq!(
            sections(&outcome.tree),
            "\
Root
└─ 1
   ├─ 1.1
   │  ├─ 1.1-1
   │  └─ 1.1-2
   └─ 1.2
      └─ 1.2-1
"
        );
    }

    #[test]
    fn level_decrease_returns_to_the_matching_ancestor() {
        let outcome = build_tree(items(&[
            ("1", Heading),
            ("1.1", Heading),
            ("1.1.1", Heading),
            ("1.2", Heading),
        ]));

        assert_eq!(
            sections(&outcome.tree),
            "\
Root
└─ 1
   ├─ 1.1
   │  └─ 1.1.1
   └─ 1.2
"
        );
    }

    #[test]
    fn level_decrease_pops_several_levels_at_once() {
        let outcome = build_tree(items(&[
            ("1", Heading),
            ("1.1", Heading),
            ("1.1.1", Heading),
            ("1.1.1.1", Heading),
            ("1.1.1.1-1", Information),
            ("2", Heading),
            ("2-1", Requirement),
        ]));

        let tree = &outcome.tree;
        let top: Vec<_> = tree
            .root()
            .children()
            .map(|n| n.item().unwrap().section())
            .collect();
        assert_eq!(top, ["1", "2"]);
        assert_eq!(tree.root().children().nth(1).unwrap().child_count(), 1);
    }

    #[test]
    fn malformed_row_is_skipped_and_does_not_move_current() {
        let outcome = build_tree(items(&[
            ("1", Heading),
            ("1.1", Heading),
            ("1..2", Requirement),
            ("1.1-1", Requirement),
            ("1.1-2", Requirement),
            ("1.2", Heading),
            ("1.2-1", Requirement),
        ]));

        assert_eq!(outcome.skipped.len(), 1);
        let skipped = &outcome.skipped[0];
        assert_eq!(skipped.source, "row 3");
        assert_eq!(skipped.section, "1..2");
        assert!(matches!(skipped.error, BuildError::Address(_)));

        assert_eq!(
            sections(&outcome.tree),
            "\
Root
└─ 1
   ├─ 1.1
   │  ├─ 1.1-1
   │  └─ 1.1-2
   └─ 1.2
      └─ 1.2-1
"
        );
    }

    #[test]
    fn push_reports_the_error_and_keeps_current() {
        let mut builder = TreeBuilder::new();
        let heading = builder
            .push(OutlineItem::new(Heading, "1", "Intro"))
            .unwrap();
        assert_eq!(builder.current(), heading);

        let error = builder
            .push(OutlineItem::new(Requirement, "", "").with_source("row 2"))
            .unwrap_err();
        assert_eq!(error, BuildError::Address(AddressError::Empty));
        assert_eq!(builder.current(), heading);

        let outcome = builder.finish();
        assert_eq!(outcome.tree.len(), 1);
        assert_eq!(outcome.skipped[0].source, "row 2");
    }

    #[test]
    fn leaves_do_not_advance_current() {
        let mut builder = TreeBuilder::new();
        let heading = builder.push(OutlineItem::new(Heading, "1", "")).unwrap();
        for ordinal in 1..=5 {
            builder
                .push(OutlineItem::new(Requirement, format!("1-{ordinal}"), ""))
                .unwrap();
            assert_eq!(builder.current(), heading);
        }

        let outcome = builder.finish();
        let heading = outcome.tree.node(heading).unwrap();
        assert_eq!(heading.child_count(), 5);
        assert!(heading.children().all(|leaf| leaf.child_count() == 0));
    }

    #[test]
    fn first_row_below_top_level_attaches_to_the_root() {
        let outcome = build_tree(items(&[("2.3.1", Heading), ("2.3.2", Heading)]));

        let root = outcome.tree.root();
        assert_eq!(root.child_count(), 1);
        let first = root.children().next().unwrap();
        assert_eq!(first.depth(), 1);
        assert_eq!(first.child_count(), 1);
    }

    #[test]
    fn preserves_document_order() {
        let input = items(&[
            ("1", Heading),
            ("1-1", Information),
            ("1.1", Heading),
            ("1.1-1", Requirement),
            ("1.1.1", Heading),
            ("1.1.1.1", Heading),
            ("1.1.1.1-1", Requirement),
            ("1.2", Heading),
            ("1.2-1", Requirement),
            ("1.2-2", Unknown),
            ("2", Heading),
            ("2.1", Heading),
            ("2.1.1", Heading),
            ("3", Heading),
            ("3-1", Requirement),
        ]);
        let expected: Vec<_> = input.iter().map(|item| item.section().to_string()).collect();

        let outcome = build_tree(input);
        let actual: Vec<_> = outcome
            .tree
            .items()
            .map(|item| item.section().to_string())
            .collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn shallower_leaf_is_skipped() {
        let outcome = build_tree(items(&[
            ("1", Heading),
            ("1.1", Heading),
            ("1-1", Requirement),
            ("1.1-1", Requirement),
        ]));

        assert_eq!(outcome.skipped.len(), 1);
        let skipped = &outcome.skipped[0];
        assert_eq!(skipped.source, "row 3");
        assert_eq!(
            skipped.error,
            BuildError::LeafAboveSection { level: 1, depth: 2 }
        );
        assert_eq!(
            sections(&outcome.tree),
            "\
Root
└─ 1
   └─ 1.1
      └─ 1.1-1
"
        );
    }

    #[test]
    fn leaf_before_any_heading_is_skipped() {
        let mut builder = TreeBuilder::new();
        let error = builder
            .push(OutlineItem::new(Requirement, "1-1", "").with_source("row 1"))
            .unwrap_err();
        assert_eq!(error, BuildError::LeafWithoutHeading { level: 1 });
        assert_eq!(builder.current(), NodeId::ROOT);

        let heading = builder.push(OutlineItem::new(Heading, "1", "")).unwrap();
        assert_eq!(builder.current(), heading);

        let outcome = builder.finish();
        assert_eq!(outcome.tree.len(), 1);
        assert_eq!(outcome.skipped[0].source, "row 1");
        assert!(outcome.tree.root().children().all(|node| node.item().unwrap().is_heading()));
    }

    #[test]
    fn empty_input_builds_an_empty_tree() {
        let outcome = build_tree(Vec::new());
        assert!(outcome.tree.is_empty());
        assert!(outcome.skipped.is_empty());
    }
}
