//! Document outlines from flat tabular rows
//!
//! Rows exported from a requirements document carry a section string such
//! as `1.15.1-2` and an artifact type, but no explicit structure. This crate
//! rebuilds the outline tree from the row order, derives a canonical
//! numbering from that tree, and reports numbering inconsistencies in the
//! source.

pub mod domain;
pub use domain::{
    ArtifactKind, Config, ConsistencyChecker, ConsistencyReport, HierarchyAddress, OutlineItem,
    OutlineTree, Renumberer, Renumbering, Row, TreeBuilder,
};

mod outline;
pub use outline::{FlatRecord, Outline};

/// Reading and writing row files.
pub mod storage;
pub use storage::{load_rows, save_rows, RowsError};
