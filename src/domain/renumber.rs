//! Canonical numbering derived from tree structure
//!
//! Every non-root node is numbered from its parent's numbering and its
//! position among its siblings. Heading siblings and leaf siblings are
//! counted separately, so under `1.2` the headings are `1.2.1`, `1.2.2`, ...
//! and the leaves are `1.2-1`, `1.2-2`, ... regardless of how they
//! interleave.

use std::collections::{BTreeMap, HashMap};

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::tree::{Node, NodeId, OutlineTree, Sectioned, Tree};

/// A part of the tree that cannot be numbered canonically.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructuralViolation {
    /// A leaf with children of its own.
    ///
    /// Leaf numberings cannot be extended, so the subtree below the leaf is
    /// left unnumbered and the numbering of that branch must not be trusted.
    #[error("leaf {numbering} has {children} child node(s); its subtree was not numbered")]
    LeafWithChildren {
        /// The offending leaf.
        node: NodeId,
        /// The canonical numbering the leaf itself received.
        numbering: String,
        /// Number of direct children below the leaf.
        children: usize,
    },

    /// A leaf directly below the root, with no heading to number it from.
    /// Neither the leaf nor its subtree is numbered.
    #[error("leaf node {} has no heading above it and was not numbered", .node.index())]
    LeafWithoutHeading {
        /// The offending leaf.
        node: NodeId,
    },
}

impl StructuralViolation {
    /// The node the violation was found at.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        match self {
            Self::LeafWithChildren { node, .. } | Self::LeafWithoutHeading { node } => *node,
        }
    }
}

/// Computes canonical numberings for outline trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct Renumberer;

impl Renumberer {
    /// Numbers the whole tree in one depth-first pass.
    #[must_use]
    #[instrument(level = "debug", skip_all, fields(nodes = tree.len()))]
    pub fn renumber<T: Sectioned>(tree: &Tree<T>) -> Renumbering {
        let mut numbers = Renumbering::default();
        number_children(tree.root(), "", &mut numbers);
        numbers.finish()
    }

    /// Numbers each top-level section on the rayon thread pool.
    ///
    /// The top-level children are numbered up front; each of their subtrees
    /// is then numbered independently and the results are concatenated in
    /// sibling order. The result is identical to [`Renumberer::renumber`].
    #[must_use]
    #[instrument(level = "debug", skip_all, fields(nodes = tree.len()))]
    pub fn renumber_parallel<T: Sectioned + Sync>(tree: &Tree<T>) -> Renumbering {
        let mut counter = SiblingCounter::default();
        let sections: Vec<_> = tree
            .root()
            .children()
            .filter_map(|child| {
                let item = child.item()?;
                Some((child, counter.next("", item.is_heading())))
            })
            .collect();

        let parts: Vec<Renumbering> = sections
            .into_par_iter()
            .map(|(section, numbering)| {
                let mut numbers = Renumbering::default();
                match numbering {
                    Some(numbering) => number_subtree(section, numbering, &mut numbers),
                    None => numbers.reject(StructuralViolation::LeafWithoutHeading {
                        node: section.id(),
                    }),
                }
                numbers
            })
            .collect();

        let mut numbers = Renumbering::default();
        for part in parts {
            numbers.entries.extend(part.entries);
            numbers.violations.extend(part.violations);
        }
        numbers.finish()
    }
}

#[derive(Debug, Default)]
struct SiblingCounter {
    headings: u32,
    leaves: u32,
}

impl SiblingCounter {
    /// The numbering of the next sibling, or `None` for a leaf below the
    /// root, which has no heading numbering to extend.
    fn next(&mut self, prefix: &str, heading: bool) -> Option<String> {
        if heading {
            self.headings += 1;
            if prefix.is_empty() {
                Some(self.headings.to_string())
            } else {
                Some(format!("{prefix}.{}", self.headings))
            }
        } else if prefix.is_empty() {
            None
        } else {
            self.leaves += 1;
            Some(format!("{prefix}-{}", self.leaves))
        }
    }
}

fn number_children<T: Sectioned>(node: Node<'_, T>, prefix: &str, numbers: &mut Renumbering) {
    let mut counter = SiblingCounter::default();
    for child in node.children() {
        let Some(item) = child.item() else { continue };
        match counter.next(prefix, item.is_heading()) {
            Some(numbering) => number_subtree(child, numbering, numbers),
            None => numbers.reject(StructuralViolation::LeafWithoutHeading { node: child.id() }),
        }
    }
}

fn number_subtree<T: Sectioned>(node: Node<'_, T>, numbering: String, numbers: &mut Renumbering) {
    let is_leaf = node.item().is_some_and(|item| !item.is_heading());
    if is_leaf && node.child_count() > 0 {
        numbers.reject(StructuralViolation::LeafWithChildren {
            node: node.id(),
            numbering: numbering.clone(),
            children: node.child_count(),
        });
        numbers.entries.push((node.id(), numbering));
        return;
    }

    numbers.entries.push((node.id(), numbering.clone()));
    number_children(node, &numbering, numbers);
}

/// Canonical numberings keyed by node, in depth-first pre-order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renumbering {
    entries: Vec<(NodeId, String)>,
    positions: HashMap<NodeId, usize>,
    violations: Vec<StructuralViolation>,
}

/// A change to apply to one source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Provenance of the row.
    pub source: String,
    /// The hierarchy cell as it appeared in the row.
    pub section: String,
    /// The canonical numbering that replaces it.
    pub numbering: String,
}

impl Renumbering {
    fn reject(&mut self, violation: StructuralViolation) {
        warn!("{violation}");
        self.violations.push(violation);
    }

    fn finish(mut self) -> Self {
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, (id, _))| (*id, position))
            .collect();
        debug!(
            numbered = self.entries.len(),
            violations = self.violations.len(),
            "renumbering complete"
        );
        self
    }

    /// The canonical numbering of a node, if it received one.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&str> {
        let position = *self.positions.get(&id)?;
        Some(self.entries[position].1.as_str())
    }

    /// All numberings, in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.entries.iter().map(|(id, numbering)| (*id, numbering.as_str()))
    }

    /// Number of numbered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was numbered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nodes that could not be numbered canonically, in depth-first
    /// pre-order. The affected subtrees are missing from the numbering.
    #[must_use]
    pub fn violations(&self) -> &[StructuralViolation] {
        &self.violations
    }

    /// Whether every node of the tree was numbered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.violations.is_empty()
    }

    /// Maps each node's prior canonical address to its new numbering.
    ///
    /// When several nodes share a prior address, the first one in document
    /// order wins.
    #[must_use]
    pub fn by_address(&self, tree: &OutlineTree) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for (id, numbering) in self.iter() {
            let Some(item) = tree.node(id).and_then(|node| node.item()) else {
                continue;
            };
            map.entry(item.address().to_string())
                .or_insert_with(|| numbering.to_string());
        }
        map
    }

    /// The rows whose canonical numbering differs from their current
    /// address, in document order.
    #[must_use]
    pub fn patches(&self, tree: &OutlineTree) -> Vec<Patch> {
        self.iter()
            .filter_map(|(id, numbering)| {
                let item = tree.node(id)?.item()?;
                (item.address().to_string() != numbering).then(|| Patch {
                    source: item.source().to_string(),
                    section: item.section().to_string(),
                    numbering: numbering.to_string(),
                })
            })
            .collect()
    }
}
