//! Ordered n-ary tree for document outlines
//!
//! The [`Tree`] is an arena: nodes live in a single vector and refer to each
//! other by [`NodeId`]. Every node owns an ordered list of child ids and keeps
//! a plain id back to its parent, so there are no reference cycles. Node 0 is
//! the root sentinel, which carries no item.
//!
//! Nodes are only ever appended. Once built, a tree is read through borrowed
//! [`Node`] views.

use std::fmt;

use thiserror::Error;

use crate::domain::OutlineItem;

/// Identifies a node within one [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root sentinel of every tree.
    pub const ROOT: Self = Self(0);

    /// Position of the node in creation order; the root is 0.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Payloads that take part in outline numbering.
pub trait Sectioned {
    /// Whether the payload is a heading. Headings extend the dotted part of a
    /// numbering, everything else receives a dash suffix.
    fn is_heading(&self) -> bool;
}

impl Sectioned for OutlineItem {
    fn is_heading(&self) -> bool {
        Self::is_heading(self)
    }
}

#[derive(Debug, Clone)]
struct NodeData<T> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
    item: Option<T>,
}

/// An ordered tree with a payload-free root.
#[derive(Debug, Clone)]
pub struct Tree<T> {
    nodes: Vec<NodeData<T>>,
}

/// The outline tree produced by the
/// [`TreeBuilder`](crate::domain::TreeBuilder).
pub type OutlineTree = Tree<OutlineItem>;

/// Errors raised while navigating a tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The requested depth lies below the node.
    #[error("node at depth {depth} has no ancestor at depth {requested}")]
    NoAncestorAtDepth {
        /// The depth that was asked for.
        requested: usize,
        /// The depth of the node the lookup started from.
        depth: usize,
    },
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self {
            nodes: vec![NodeData {
                parent: None,
                children: Vec::new(),
                depth: 0,
                item: None,
            }],
        }
    }
}

impl<T> Tree<T> {
    /// Creates a tree holding only the root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree with room for `capacity` nodes besides the root.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut tree = Self::default();
        tree.nodes.reserve(capacity);
        tree
    }

    /// The root sentinel.
    #[must_use]
    pub fn root(&self) -> Node<'_, T> {
        Node {
            tree: self,
            id: NodeId::ROOT,
        }
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<Node<'_, T>> {
        (id.0 < self.nodes.len()).then_some(Node { tree: self, id })
    }

    /// A view of a node whose id is known to belong to this tree.
    pub(crate) const fn at(&self, id: NodeId) -> Node<'_, T> {
        Node { tree: self, id }
    }

    /// Appends `item` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree.
    pub(crate) fn add_child(&mut self, parent: NodeId, item: T) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(NodeData {
            parent: Some(parent),
            children: Vec::new(),
            depth,
            item: Some(item),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Number of nodes, not counting the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the tree holds nothing but the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walks all nodes except the root, depth-first and pre-order.
    #[must_use]
    pub fn iter(&self) -> PreOrder<'_, T> {
        self.root().descendants()
    }

    /// The payloads of all nodes in depth-first pre-order.
    pub fn items(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().filter_map(|node| node.item())
    }

    /// Draws the tree with box characters, one node per line.
    ///
    /// The root is printed as `Root`; every other node is printed with the
    /// text returned by `label`.
    #[must_use]
    pub fn render(&self, mut label: impl FnMut(Node<'_, T>) -> String) -> String {
        let mut out = String::from("Root\n");
        render_children(self.root(), "", &mut label, &mut out);
        out
    }

    fn data(&self, id: NodeId) -> &NodeData<T> {
        &self.nodes[id.0]
    }
}

fn render_children<'a, T>(
    node: Node<'a, T>,
    indent: &str,
    label: &mut impl FnMut(Node<'a, T>) -> String,
    out: &mut String,
) {
    let count = node.child_count();
    for (i, child) in node.children().enumerate() {
        let (branch, continuation) = if i + 1 == count {
            ("└─ ", "   ")
        } else {
            ("├─ ", "│  ")
        };
        out.push_str(indent);
        out.push_str(branch);
        out.push_str(&label(child));
        out.push('\n');
        render_children(child, &format!("{indent}{continuation}"), label, out);
    }
}

/// A borrowed view of one node.
pub struct Node<'a, T> {
    tree: &'a Tree<T>,
    id: NodeId,
}

impl<T> Clone for Node<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Node<'_, T> {}

impl<T> PartialEq for Node<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<T> Eq for Node<'_, T> {}

impl<T> fmt::Debug for Node<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

impl<'a, T> Node<'a, T> {
    /// The node's id.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// The payload; `None` only for the root.
    #[must_use]
    pub fn item(&self) -> Option<&'a T> {
        self.tree.data(self.id).item.as_ref()
    }

    /// Whether this is the root sentinel.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.id == NodeId::ROOT
    }

    /// The parent node; `None` only for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let tree = self.tree;
        tree.data(self.id).parent.map(|id| Node { tree, id })
    }

    /// The children, in insertion order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = Self> + use<'a, T> {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.tree.data(self.id).children.len()
    }

    /// Distance from the root, which has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.tree.data(self.id).depth
    }

    /// Number of non-root nodes in the subtree rooted here, including this
    /// node.
    #[must_use]
    pub fn count(&self) -> usize {
        self.descendants().count() + usize::from(!self.is_root())
    }

    /// The ancestor (or this node itself) at the given depth.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NoAncestorAtDepth`] if `depth` is greater than
    /// this node's depth.
    pub fn ancestor_at_depth(&self, depth: usize) -> Result<Self, TreeError> {
        if depth > self.depth() {
            return Err(TreeError::NoAncestorAtDepth {
                requested: depth,
                depth: self.depth(),
            });
        }

        let mut node = *self;
        while node.depth() > depth {
            let Some(parent) = node.parent() else { break };
            node = parent;
        }
        Ok(node)
    }

    /// Walks the subtree below this node, depth-first and pre-order. The node
    /// itself is not included.
    #[must_use]
    pub fn descendants(&self) -> PreOrder<'a, T> {
        PreOrder {
            tree: self.tree,
            stack: self.tree.data(self.id).children.iter().rev().copied().collect(),
        }
    }
}

/// Depth-first, pre-order iterator over tree nodes.
pub struct PreOrder<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<NodeId>,
}

impl<'a, T> Iterator for PreOrder<'a, T> {
    type Item = Node<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.data(id).children.iter().rev().copied());
        Some(Node {
            tree: self.tree,
            id,
        })
    }
}
