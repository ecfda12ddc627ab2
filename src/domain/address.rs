use std::{borrow::Cow, fmt, num::NonZeroU32, str::FromStr, sync::LazyLock};

use regex::Regex;

/// A position in a document outline, parsed from a section string.
///
/// Format:
/// `{P1}.{P2}...{Pn}` for a heading, or `{P1}.{P2}...{Pn}-{ORDINAL}` for a
/// leaf item, where:
/// - each `P` is a positive integer, giving the 1-based position of the
///   heading at that depth
/// - `ORDINAL` is a positive integer, giving the 1-based position of the leaf
///   among the leaf items directly under heading `P1...Pn`
///
/// Examples: `3`, `1.15.1`, `1.15.1-2`
///
/// An address may also be *invalid*: it has an empty path and no ordinal.
/// [`HierarchyAddress::parse`] returns an invalid address instead of an error
/// when the input does not match the grammar, so callers must check
/// [`HierarchyAddress::is_valid`] before relying on the level.
///
/// Two addresses are equal exactly when their canonical string forms are
/// equal, so `01.2` and `1.2` compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HierarchyAddress {
    path: Vec<NonZeroU32>,
    leaf: Option<NonZeroU32>,
}

impl HierarchyAddress {
    /// Creates a heading address from its numeric path.
    ///
    /// An empty path produces an invalid address.
    #[must_use]
    pub const fn heading(path: Vec<NonZeroU32>) -> Self {
        Self { path, leaf: None }
    }

    /// Creates a leaf address under the heading at `path`.
    ///
    /// An empty path produces an invalid address; the ordinal is discarded.
    #[must_use]
    pub fn leaf(path: Vec<NonZeroU32>, ordinal: NonZeroU32) -> Self {
        if path.is_empty() {
            return Self::invalid();
        }
        Self {
            path,
            leaf: Some(ordinal),
        }
    }

    /// The invalid address.
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            path: Vec::new(),
            leaf: None,
        }
    }

    /// Parses a section string, falling back to the invalid address.
    ///
    /// Use [`str::parse`] instead to learn why a string was rejected.
    ///
    /// ```
    /// use outline::HierarchyAddress;
    ///
    /// let address = HierarchyAddress::parse("1.15.1-2");
    /// assert!(address.is_valid());
    /// assert!(address.is_leaf());
    /// assert_eq!(address.level(), 3);
    /// assert_eq!(address.to_string(), "1.15.1-2");
    ///
    /// let broken = HierarchyAddress::parse("1..2");
    /// assert!(!broken.is_valid());
    /// assert_eq!(broken.level(), 0);
    /// ```
    #[must_use]
    pub fn parse(section: &str) -> Self {
        section.parse().unwrap_or_default()
    }

    /// Whether the address was parsed successfully.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.path.is_empty()
    }

    /// The outline level, which is the number of path segments.
    ///
    /// A leaf shares the level of the heading it belongs to. The invalid
    /// address has level 0.
    #[must_use]
    pub fn level(&self) -> usize {
        self.path.len()
    }

    /// Whether this address denotes a leaf item rather than a heading.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }

    /// The numeric heading path.
    #[must_use]
    pub fn path(&self) -> &[NonZeroU32] {
        &self.path
    }

    /// The leaf ordinal, present only for leaf addresses.
    #[must_use]
    pub const fn leaf_ordinal(&self) -> Option<NonZeroU32> {
        self.leaf
    }

    /// The address this one is nested under.
    ///
    /// For a leaf this is the heading it belongs to. For a heading it is the
    /// enclosing heading, or `None` for a top-level heading.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_leaf() {
            return Some(Self::heading(self.path.clone()));
        }
        match self.path.split_last() {
            Some((_, head)) if !head.is_empty() => Some(Self::heading(head.to_vec())),
            _ => None,
        }
    }

    /// The address one position earlier at the same level.
    ///
    /// Returns `None` when the last component is already 1.
    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        self.step(|n| NonZeroU32::new(n.get() - 1))
    }

    /// The address one position later at the same level.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        self.step(|n| n.checked_add(1))
    }

    fn step(&self, f: impl Fn(NonZeroU32) -> Option<NonZeroU32>) -> Option<Self> {
        if let Some(ordinal) = self.leaf {
            return Some(Self {
                path: self.path.clone(),
                leaf: Some(f(ordinal)?),
            });
        }

        let (last, head) = self.path.split_last()?;
        let mut path = head.to_vec();
        path.push(f(*last)?);
        Some(Self::heading(path))
    }
}

impl fmt::Display for HierarchyAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, segment) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        if let Some(ordinal) = self.leaf {
            write!(f, "-{ordinal}")?;
        }
        Ok(())
    }
}

/// Errors that can occur while parsing a section string.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The section string is empty or whitespace.
    #[error("Empty hierarchy address")]
    Empty,

    /// More than one `-` separates path and leaf ordinal.
    #[error("Invalid hierarchy address '{0}': more than one leaf separator")]
    LeafSeparators(String),

    /// A segment is not a positive integer.
    #[error("Invalid segment '{segment}' in hierarchy address '{address}': expected a positive integer")]
    Segment {
        /// The whole section string.
        address: String,
        /// The offending segment.
        segment: String,
    },
}

impl FromStr for HierarchyAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let section = s.trim();
        if section.is_empty() {
            return Err(Error::Empty);
        }

        let (head, leaf) = match section.split_once('-') {
            Some((_, leaf)) if leaf.contains('-') => {
                return Err(Error::LeafSeparators(section.to_string()));
            }
            Some((head, leaf)) => (head, Some(parse_segment(section, leaf)?)),
            None => (section, None),
        };

        let path = head
            .split('.')
            .map(|segment| parse_segment(section, segment))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { path, leaf })
    }
}

impl TryFrom<&str> for HierarchyAddress {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

fn parse_segment(address: &str, segment: &str) -> Result<NonZeroU32, Error> {
    let invalid = || Error::Segment {
        address: address.to_string(),
        segment: segment.to_string(),
    };

    // `u32::from_str` would also accept a leading '+'
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    segment.parse().map_err(|_| invalid())
}

static ZERO_LEAF_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.0-(\d+)$").expect("this should never fail"));

/// Rewrites a trailing `.0-N` to `-N`.
///
/// Exported documents often number the leaves directly under heading `a.b`
/// as `a.b.0-N`. Other zero segments are left alone and still fail to parse.
#[must_use]
pub fn repair_zero_leaf_section(section: &str) -> Cow<'_, str> {
    ZERO_LEAF_SECTION.replace(section.trim(), "-$1")
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn nz(values: &[u32]) -> Vec<NonZeroU32> {
        values.iter().map(|&v| NonZeroU32::new(v).unwrap()).collect()
    }

    #[test_case("3", &[3], None; "top level heading")]
    #[test_case("1.15.1", &[1, 15, 1], None; "nested heading")]
    #[test_case("1.15.1-2", &[1, 15, 1], Some(2); "leaf")]
    #[test_case("4-1", &[4], Some(1); "leaf under top level heading")]
    #[test_case("  2.1 ", &[2, 1], None; "surrounding whitespace")]
    #[test_case("01.002", &[1, 2], None; "leading zeros")]
    fn parses_valid(input: &str, path: &[u32], leaf: Option<u32>) {
        let address: HierarchyAddress = input.parse().unwrap();
        assert!(address.is_valid());
        assert_eq!(address.path(), nz(path).as_slice());
        assert_eq!(address.leaf_ordinal().map(NonZeroU32::get), leaf);
        assert_eq!(address.level(), path.len());
        assert_eq!(address.is_leaf(), leaf.is_some());
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(HierarchyAddress::from_str(""), Err(Error::Empty));
        assert_eq!(HierarchyAddress::from_str("   "), Err(Error::Empty));
    }

    #[test]
    fn multiple_dashes_are_rejected() {
        assert!(matches!(
            HierarchyAddress::from_str("1.1-2-3"),
            Err(Error::LeafSeparators(_))
        ));
    }

    #[test_case("1..2"; "empty segment")]
    #[test_case("1.a"; "letters")]
    #[test_case("1.0"; "zero segment")]
    #[test_case("1.1-0"; "zero ordinal")]
    #[test_case("-1"; "missing path")]
    #[test_case("1.1-"; "missing ordinal")]
    #[test_case("1.+2"; "sign")]
    #[test_case("1. 2"; "inner whitespace")]
    #[test_case("1.99999999999"; "overflow")]
    fn rejects_bad_segments(input: &str) {
        assert!(matches!(
            HierarchyAddress::from_str(input),
            Err(Error::Segment { .. })
        ));
    }

    #[test]
    fn lenient_parse_falls_back_to_invalid() {
        let address = HierarchyAddress::parse("1..2");
        assert!(!address.is_valid());
        assert!(!address.is_leaf());
        assert_eq!(address.level(), 0);
        assert_eq!(address, HierarchyAddress::invalid());
        assert_eq!(address.to_string(), "");
    }

    #[test_case("3")]
    #[test_case("1.15.1")]
    #[test_case("1.15.1-2")]
    #[test_case("12.4.7.1-19")]
    fn display_roundtrip(input: &str) {
        let address = HierarchyAddress::parse(input);
        assert_eq!(address.to_string(), input);
        assert_eq!(HierarchyAddress::parse(&address.to_string()), address);
    }

    #[test]
    fn equality_follows_canonical_form() {
        assert_eq!(HierarchyAddress::parse("01.2"), HierarchyAddress::parse("1.2"));
        assert_ne!(HierarchyAddress::parse("1.2"), HierarchyAddress::parse("1.2-1"));
        assert_ne!(HierarchyAddress::parse("1.2"), HierarchyAddress::parse("1.2.1"));
    }

    #[test]
    fn orders_in_document_order() {
        let mut addresses: Vec<_> = ["1.2", "1.1-2", "1", "1.1.1", "1.1-1", "1.1", "2"]
            .into_iter()
            .map(HierarchyAddress::parse)
            .collect();
        addresses.sort();
        let rendered: Vec<_> = addresses.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["1", "1.1", "1.1-1", "1.1-2", "1.1.1", "1.2", "2"]);
    }

    #[test_case("1.1-3", Some("1.1"); "leaf to heading")]
    #[test_case("1.1.4", Some("1.1"); "nested heading")]
    #[test_case("7-1", Some("7"); "leaf under top level")]
    #[test_case("7", None; "top level heading")]
    #[test_case("1..x", None; "invalid")]
    fn parent(input: &str, expected: Option<&str>) {
        let parent = HierarchyAddress::parse(input).parent();
        assert_eq!(parent.map(|p| p.to_string()).as_deref(), expected);
    }

    #[test_case("1.1-3", Some("1.1-2"); "leaf")]
    #[test_case("1.1-1", None; "first leaf")]
    #[test_case("1.4", Some("1.3"); "heading")]
    #[test_case("2.1", None; "first heading")]
    #[test_case("", None; "invalid")]
    fn previous(input: &str, expected: Option<&str>) {
        let previous = HierarchyAddress::parse(input).previous();
        assert_eq!(previous.map(|p| p.to_string()).as_deref(), expected);
    }

    #[test_case("1.1-3", Some("1.1-4"); "leaf")]
    #[test_case("1.4", Some("1.5"); "heading")]
    #[test_case("9", Some("10"); "top level")]
    #[test_case("", None; "invalid")]
    fn next(input: &str, expected: Option<&str>) {
        let next = HierarchyAddress::parse(input).next();
        assert_eq!(next.map(|p| p.to_string()).as_deref(), expected);
    }

    #[test]
    fn previous_then_next_is_identity_for_later_leaves() {
        for ordinal in 2..20 {
            let address = HierarchyAddress::parse(&format!("3.2-{ordinal}"));
            let roundtrip = address.previous().and_then(|p| p.next());
            assert_eq!(roundtrip, Some(address));
        }
    }

    #[test]
    fn leaf_constructor_requires_a_path() {
        let one = NonZeroU32::MIN;
        assert!(!HierarchyAddress::leaf(Vec::new(), one).is_valid());
        assert_eq!(HierarchyAddress::leaf(nz(&[2, 3]), one).to_string(), "2.3-1");
        assert_eq!(HierarchyAddress::heading(nz(&[2, 3])).to_string(), "2.3");
    }

    #[test_case("1.2.0-4", "1.2-4"; "trailing zero heading")]
    #[test_case(" 1.0-1 ", "1-1"; "trimmed")]
    #[test_case("1.2-4", "1.2-4"; "already canonical")]
    #[test_case("1.0.2-4", "1.0.2-4"; "inner zero untouched")]
    #[test_case("1.2.0", "1.2.0"; "zero heading untouched")]
    fn repairs_zero_leaf_sections(input: &str, expected: &str) {
        assert_eq!(repair_zero_leaf_section(input), expected);
    }
}
