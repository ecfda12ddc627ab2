//! End-to-end processing of one row sequence.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::{
    build_tree, ArtifactKind, BuildOutcome, Config, ConsistencyChecker, ConsistencyReport, Node,
    OutlineItem, OutlineTree, Patch, Renumberer, Renumbering, Row, SkippedRow,
};

/// A processed outline: the consistency report of the flat sequence, the
/// reconstructed tree, the rows that could not be placed, and the canonical
/// numbering.
///
/// Results are always returned in full, even when rows were skipped or the
/// numbering is incomplete. Callers decide how strict to be.
#[derive(Debug, Clone)]
pub struct Outline {
    report: ConsistencyReport,
    tree: OutlineTree,
    skipped: Vec<SkippedRow>,
    numbering: Renumbering,
}

impl Outline {
    /// Maps rows onto items with `config`, then processes them.
    #[must_use]
    #[instrument(level = "debug", skip_all)]
    pub fn from_rows(rows: impl IntoIterator<Item = Row>, config: &Config) -> Self {
        let items: Vec<OutlineItem> = rows
            .into_iter()
            .map(|row| OutlineItem::from_row(row, config))
            .collect();
        Self::from_items(items)
    }

    /// Checks the sequence, builds the tree and renumbers it.
    #[must_use]
    #[instrument(level = "debug", skip_all, fields(items = items.len()))]
    pub fn from_items(items: Vec<OutlineItem>) -> Self {
        let report = ConsistencyChecker::check(&items);
        let BuildOutcome { tree, skipped } = build_tree(items);
        let numbering = Renumberer::renumber_parallel(&tree);

        info!(
            "Processed outline: {} nodes, {} skipped rows, {} diagnostics",
            tree.len(),
            skipped.len(),
            report.diagnostics.len()
        );

        Self {
            report,
            tree,
            skipped,
            numbering,
        }
    }

    /// The consistency report of the input sequence.
    #[must_use]
    pub const fn report(&self) -> &ConsistencyReport {
        &self.report
    }

    /// The reconstructed tree.
    #[must_use]
    pub const fn tree(&self) -> &OutlineTree {
        &self.tree
    }

    /// Rows left out of the tree.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    /// The canonical numbering of the tree.
    #[must_use]
    pub const fn numbering(&self) -> &Renumbering {
        &self.numbering
    }

    /// Whether every row made it into the tree and every node was numbered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.numbering.is_complete()
    }

    /// Prior canonical address to new numbering, see
    /// [`Renumbering::by_address`].
    #[must_use]
    pub fn by_address(&self) -> BTreeMap<String, String> {
        self.numbering.by_address(&self.tree)
    }

    /// Rows whose numbering changes, see [`Renumbering::patches`].
    #[must_use]
    pub fn patches(&self) -> Vec<Patch> {
        self.numbering.patches(&self.tree)
    }

    /// Draws the tree, labelling each node `[<numbering>] <item>`.
    #[must_use]
    pub fn render(&self) -> String {
        self.tree.render(|node| {
            let numbering = self.numbering.get(node.id()).unwrap_or("?");
            match node.item() {
                Some(item) => format!("[{numbering}] {item}"),
                None => format!("[{numbering}]"),
            }
        })
    }

    /// Writes the canonical numbering into the numbering column of `rows`.
    ///
    /// Rows are matched to tree nodes by their source, so every row keeps
    /// its own numbering even when several rows share an address. Rows that
    /// were skipped or left unnumbered are not touched. Returns the number
    /// of cells that changed.
    pub fn sanitize(&self, rows: &mut [Row], config: &Config) -> usize {
        let numbering: HashMap<&str, &str> = self
            .numbering
            .iter()
            .filter_map(|(id, numbering)| {
                let item = self.tree.node(id)?.item()?;
                Some((item.source(), numbering))
            })
            .collect();
        let mut changed = 0;

        for row in rows {
            let Some(new) = numbering.get(row.source.as_str()).copied() else {
                continue;
            };
            if row.cell(config.numbering_field()) != Some(new) {
                row.cells
                    .insert(config.numbering_field().to_string(), new.to_string());
                changed += 1;
            }
        }

        info!("Patched {changed} numbering cells");
        changed
    }

    /// One record per node in document order, carrying the canonical
    /// numbering.
    #[must_use]
    pub fn flatten(&self) -> Vec<FlatRecord> {
        self.tree
            .iter()
            .filter_map(|node| {
                let item = node.item()?;
                let chapter = node
                    .parent()
                    .filter(|parent| !parent.is_root())
                    .unwrap_or(node);
                Some(FlatRecord {
                    source: item.source().to_string(),
                    kind: item.kind(),
                    identifier: self.numbering.get(node.id()).map(str::to_string),
                    title: self.title(node),
                    level: node.depth(),
                    chapter: self.title(chapter),
                    content: item.content().to_string(),
                    fields: item.fields().clone(),
                })
            })
            .collect()
    }

    /// Like [`OutlineItem::title`], but with the canonical numbering when
    /// the node has one.
    fn title(&self, node: Node<'_, OutlineItem>) -> String {
        let Some(item) = node.item() else {
            return String::new();
        };
        match self.numbering.get(node.id()) {
            Some(numbering) if item.is_heading() => format!("{numbering} {}", item.content()),
            Some(numbering) => format!("REQ {numbering}"),
            None => item.title(),
        }
    }
}

/// One row of the flattened outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRecord {
    /// Provenance of the source row.
    pub source: String,
    /// Artifact kind.
    pub kind: ArtifactKind,
    /// Canonical numbering, absent for nodes that could not be numbered.
    pub identifier: Option<String>,
    /// One-line title built from the canonical numbering.
    pub title: String,
    /// Depth in the tree, top-level nodes being 1.
    pub level: usize,
    /// Title of the enclosing heading. Top-level headings are their own
    /// chapter.
    pub chapter: String,
    /// Trimmed content text.
    pub content: String,
    /// All other columns of the source row.
    pub fields: BTreeMap<String, String>,
}

impl From<FlatRecord> for Row {
    /// Lays the record out as `Type`, `Identifier`, `Title`, `Level`,
    /// `Chapter` and `Content` columns, followed by the other columns of the
    /// source row.
    fn from(record: FlatRecord) -> Self {
        let mut row = Self::new(record.source);
        row.cells = record.fields;
        row.with_cell("Type", record.kind.as_str())
            .with_cell("Identifier", record.identifier.unwrap_or_default())
            .with_cell("Title", record.title)
            .with_cell("Level", record.level.to_string())
            .with_cell("Chapter", record.chapter)
            .with_cell("Content", record.content)
    }
}
