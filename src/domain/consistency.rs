//! Numbering consistency checks over the flat item sequence
//!
//! The checker never builds a tree and never fails. It reports what a
//! reviewer needs to spot numbering mistakes in the source document: the
//! level change after every heading, diagnostics for transitions that
//! cannot be right, and an overview of the levels in use.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::{ArtifactKind, OutlineItem};

/// Checks a flat item sequence for numbering anomalies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyChecker;

/// The parts of an item that appear in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRef {
    /// Provenance of the row.
    pub source: String,
    /// Canonical address.
    pub address: String,
    /// One-line title, see [`OutlineItem::title`].
    pub title: String,
    /// Artifact kind.
    pub kind: ArtifactKind,
    /// Outline level.
    pub level: usize,
}

impl From<&OutlineItem> for ItemRef {
    fn from(item: &OutlineItem) -> Self {
        Self {
            source: item.source().to_string(),
            address: item.address().to_string(),
            title: item.title(),
            kind: item.kind(),
            level: item.level(),
        }
    }
}

/// A heading and the item right after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// The heading.
    pub current: ItemRef,
    /// Its immediate successor.
    pub next: ItemRef,
    /// `next.level - current.level`.
    pub delta: isize,
}

/// A finding that deserves a reviewer's attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "diagnostic", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A heading is followed by a heading more than one level deeper.
    LevelJump {
        /// The heading.
        from: ItemRef,
        /// The heading after it.
        to: ItemRef,
        /// The level difference.
        delta: isize,
    },

    /// A non-heading item whose level differs from that of the heading it
    /// belongs to.
    LeafLevelMismatch {
        /// The item.
        leaf: ItemRef,
        /// The most recent heading before it.
        heading: ItemRef,
    },

    /// A non-heading item that appears before any heading.
    OrphanLeaf {
        /// The item.
        leaf: ItemRef,
    },

    /// A row whose hierarchy cell does not parse.
    InvalidAddress {
        /// Provenance of the row.
        source: String,
        /// The hierarchy cell as it appeared in the row.
        section: String,
        /// The parse error.
        error: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LevelJump { from, to, delta } => write!(
                f,
                "{} (level {}) is followed by {} (level {}), a jump of {delta} levels",
                from.address, from.level, to.address, to.level
            ),
            Self::LeafLevelMismatch { leaf, heading } => write!(
                f,
                "{} {} is at level {} but its heading {} is at level {}",
                leaf.kind, leaf.address, leaf.level, heading.address, heading.level
            ),
            Self::OrphanLeaf { leaf } => {
                write!(f, "{} {} appears before any heading", leaf.kind, leaf.address)
            }
            Self::InvalidAddress { section, error, .. } => {
                write!(f, "'{section}' is not a valid address: {error}")
            }
        }
    }
}

impl Diagnostic {
    /// Where the offending row came from.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::LevelJump { to: item, .. }
            | Self::LeafLevelMismatch { leaf: item, .. }
            | Self::OrphanLeaf { leaf: item } => &item.source,
            Self::InvalidAddress { source, .. } => source,
        }
    }
}

/// How one outline level is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelSummary {
    /// The level.
    pub level: usize,
    /// Number of items at this level.
    pub count: usize,
    /// The first item seen at this level.
    pub sample: ItemRef,
}

/// Everything the checker found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Level change after each heading, in document order.
    pub transitions: Vec<Transition>,
    /// Findings, in document order.
    pub diagnostics: Vec<Diagnostic>,
    /// The distinct levels in use, ascending.
    pub levels: Vec<LevelSummary>,
}

impl ConsistencyReport {
    /// Whether the checker found nothing to complain about.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Levels between the shallowest and the deepest level in use that no
    /// item occupies.
    #[must_use]
    pub fn gaps(&self) -> Vec<usize> {
        let (Some(first), Some(last)) = (self.levels.first(), self.levels.last()) else {
            return Vec::new();
        };
        (first.level..=last.level)
            .filter(|level| self.levels.iter().all(|summary| summary.level != *level))
            .collect()
    }
}

impl ConsistencyChecker {
    /// Checks `items` in document order.
    #[must_use]
    #[instrument(level = "debug", skip_all, fields(items = items.len()))]
    pub fn check(items: &[OutlineItem]) -> ConsistencyReport {
        let mut report = ConsistencyReport::default();
        let mut levels: BTreeMap<usize, LevelSummary> = BTreeMap::new();
        let mut heading: Option<&OutlineItem> = None;
        let mut previous: Option<&OutlineItem> = None;

        for item in items {
            if let Some(error) = item.address_error() {
                report.diagnostics.push(Diagnostic::InvalidAddress {
                    source: item.source().to_string(),
                    section: item.section().to_string(),
                    error: error.to_string(),
                });
                continue;
            }

            if let Some(current) = previous.filter(|previous| previous.is_heading()) {
                let transition = Transition {
                    current: current.into(),
                    next: item.into(),
                    delta: level_delta(current, item),
                };
                if item.is_heading() && transition.delta > 1 {
                    report.diagnostics.push(Diagnostic::LevelJump {
                        from: transition.current.clone(),
                        to: transition.next.clone(),
                        delta: transition.delta,
                    });
                }
                report.transitions.push(transition);
            }

            if item.is_heading() {
                heading = Some(item);
            } else {
                match heading {
                    None => report
                        .diagnostics
                        .push(Diagnostic::OrphanLeaf { leaf: item.into() }),
                    Some(heading) if heading.level() != item.level() => {
                        report.diagnostics.push(Diagnostic::LeafLevelMismatch {
                            leaf: item.into(),
                            heading: heading.into(),
                        });
                    }
                    Some(_) => {}
                }
            }

            levels
                .entry(item.level())
                .and_modify(|summary| summary.count += 1)
                .or_insert_with(|| LevelSummary {
                    level: item.level(),
                    count: 1,
                    sample: item.into(),
                });
            previous = Some(item);
        }

        report.levels = levels.into_values().collect();
        debug!(
            transitions = report.transitions.len(),
            diagnostics = report.diagnostics.len(),
            "consistency check complete"
        );
        report
    }
}

// levels are bounded by the length of a section string
#[allow(clippy::cast_possible_wrap)]
fn level_delta(from: &OutlineItem, to: &OutlineItem) -> isize {
    to.level() as isize - from.level() as isize
}
