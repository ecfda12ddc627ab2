use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::domain::{
    address::{repair_zero_leaf_section, Error as AddressError},
    Config, HierarchyAddress,
};

/// The kind of artifact a row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// A section title. Headings form the dotted part of the numbering.
    Heading,
    /// Explanatory text attached to a heading.
    Information,
    /// A requirement attached to a heading.
    Requirement,
    /// Anything else.
    Unknown,
}

impl ArtifactKind {
    /// Maps a free-text type cell onto a kind.
    ///
    /// Exact kind names match case-insensitively. Otherwise any text
    /// containing `info` is [`ArtifactKind::Information`], and everything
    /// else is [`ArtifactKind::Unknown`].
    #[must_use]
    pub fn classify(type_cell: &str) -> Self {
        let type_cell = type_cell.trim();
        [
            Self::Heading,
            Self::Information,
            Self::Requirement,
            Self::Unknown,
        ]
        .into_iter()
        .find(|kind| kind.as_str().eq_ignore_ascii_case(type_cell))
        .unwrap_or_else(|| {
            if type_cell.to_lowercase().contains("info") {
                Self::Information
            } else {
                Self::Unknown
            }
        })
    }

    /// The canonical name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heading => "Heading",
            Self::Information => "Information",
            Self::Requirement => "Requirement",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw tabular row, as produced by an external row source.
///
/// Cells are keyed by column name. `source` records where the row came from
/// (a file position or cell range) and is only used in diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    /// Provenance of the row.
    pub source: String,
    /// Cell text keyed by column name.
    pub cells: BTreeMap<String, String>,
}

impl Row {
    /// Creates an empty row with the given provenance.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Adds a cell, replacing any existing cell of the same name.
    #[must_use]
    pub fn with_cell(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    /// Returns the text of a cell.
    #[must_use]
    pub fn cell(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// The outline view of one input row.
///
/// Constructed once per row and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    kind: ArtifactKind,
    section: String,
    address: Result<HierarchyAddress, AddressError>,
    content: String,
    fields: BTreeMap<String, String>,
    source: String,
}

impl OutlineItem {
    /// Creates an item directly from its parts.
    ///
    /// The section string is parsed leniently; see
    /// [`OutlineItem::address_error`] for rows that failed to parse.
    #[must_use]
    pub fn new(kind: ArtifactKind, section: impl Into<String>, content: impl Into<String>) -> Self {
        let section = section.into();
        let content = content.into();
        Self {
            kind,
            address: section.parse(),
            section,
            content: content.trim().to_string(),
            fields: BTreeMap::new(),
            source: String::new(),
        }
    }

    /// Builds an item from a row using the configured field names.
    ///
    /// Every cell that is not the type, hierarchy, or content cell ends up in
    /// [`OutlineItem::fields`].
    #[must_use]
    pub fn from_row(row: Row, config: &Config) -> Self {
        let Row { source, mut cells } = row;

        let kind = cells
            .remove(config.type_field())
            .map_or(ArtifactKind::Unknown, |cell| ArtifactKind::classify(&cell));
        let section = cells.remove(config.hierarchy_field()).unwrap_or_default();
        let content = cells.remove(config.content_field()).unwrap_or_default();

        let address = if config.repair_zero_leaf_sections {
            repair_zero_leaf_section(&section).parse()
        } else {
            section.parse()
        };

        Self {
            kind,
            section,
            address,
            content: content.trim().to_string(),
            fields: cells,
            source,
        }
    }

    /// Sets the provenance string.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Adds an extra field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The artifact kind.
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Whether this item is a heading.
    #[must_use]
    pub fn is_heading(&self) -> bool {
        self.kind == ArtifactKind::Heading
    }

    /// The hierarchy cell exactly as it appeared in the row.
    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// The parsed address, or the invalid address if parsing failed.
    #[must_use]
    pub fn address(&self) -> &HierarchyAddress {
        static INVALID: HierarchyAddress = HierarchyAddress::invalid();
        self.address.as_ref().unwrap_or(&INVALID)
    }

    /// Why the hierarchy cell failed to parse, if it did.
    #[must_use]
    pub fn address_error(&self) -> Option<&AddressError> {
        self.address.as_ref().err()
    }

    /// The outline level, taken from the address.
    #[must_use]
    pub fn level(&self) -> usize {
        self.address().level()
    }

    /// Trimmed content text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// All other columns of the source row.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Provenance of the row.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// A one-line title: `"<address> <content>"` for headings, and
    /// `"REQ <address>"` for anything else.
    #[must_use]
    pub fn title(&self) -> String {
        if self.is_heading() {
            format!("{} {}", self.address(), self.content)
        } else {
            format!("REQ {}", self.address())
        }
    }

    /// Like [`OutlineItem::title`], but headings show only their content.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_heading() {
            self.content.clone()
        } else {
            format!("REQ {}", self.address())
        }
    }
}

const DISPLAY_CONTENT_LIMIT: usize = 50;

impl fmt::Display for OutlineItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} ", self.kind, self.address())?;
        if self.content.is_empty() {
            f.write_str("<empty>")
        } else if self.content.chars().count() > DISPLAY_CONTENT_LIMIT {
            let truncated: String = self.content.chars().take(DISPLAY_CONTENT_LIMIT).collect();
            write!(f, "{truncated}...")
        } else {
            f.write_str(&self.content)
        }
    }
}
