//! Domain models for document outlines.
//!
//! This module contains hierarchy addresses, outline items and trees, and
//! the passes that run over them: tree reconstruction, renumbering and
//! consistency checking.

/// Hierarchical section addresses and their parsing.
pub mod address;
pub use address::{Error as AddressError, HierarchyAddress};

mod config;
pub use config::Config;

mod item;
pub use item::{ArtifactKind, OutlineItem, Row};

pub mod tree;
pub use tree::{Node, NodeId, OutlineTree, Sectioned, Tree, TreeError};

mod builder;
pub use builder::{build_tree, BuildError, BuildOutcome, SkippedRow, TreeBuilder};

mod renumber;
pub use renumber::{Patch, Renumberer, Renumbering, StructuralViolation};

pub mod consistency;
pub use consistency::{ConsistencyChecker, ConsistencyReport, Diagnostic};
