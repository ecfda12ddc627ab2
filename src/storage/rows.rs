//! Row files
//!
//! A row file is a JSON or YAML list of objects, one object per table row,
//! mapping column names to cell values. Cells may be strings, integers,
//! booleans or null. Integers and booleans are converted to text on load,
//! and null cells are dropped. Files are always written back with string
//! cells.
//!
//! Unquoted decimals are rejected: `1.10` parses as a float and its text
//! cannot be recovered, which would silently turn section `1.10` into `1.1`.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Row;

/// Errors that can occur when reading or writing row files.
#[derive(Debug, thiserror::Error)]
pub enum RowsError {
    /// The row file was not found.
    #[error("row file not found: {0}")]
    NotFound(PathBuf),
    /// The file extension does not name a supported format.
    #[error("unsupported row file '{0}': expected a .json, .yaml or .yml extension")]
    UnsupportedFormat(PathBuf),
    /// An I/O error occurred.
    #[error("failed to access row file: {0}")]
    Io(#[from] io::Error),
    /// The JSON content could not be parsed or written.
    #[error("invalid JSON row file: {0}")]
    Json(#[from] serde_json::Error),
    /// The YAML content could not be parsed or written.
    #[error("invalid YAML row file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A cell holds an unquoted decimal number.
    #[error("{row}, column '{column}': unquoted decimal {value} is ambiguous; quote the cell")]
    UnquotedDecimal {
        /// The row, as `row N`.
        row: String,
        /// The column name.
        column: String,
        /// The number as parsed.
        value: f64,
    },
}

/// Serialization format of a row file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// A JSON array of objects.
    Json,
    /// A YAML sequence of mappings.
    Yaml,
}

impl Format {
    /// Picks the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`RowsError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, RowsError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(RowsError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    /// The cell as text, or the parsed value of an unquoted decimal.
    fn into_text(self) -> Result<String, f64> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Integer(value) => Ok(value.to_string()),
            Self::Bool(value) => Ok(value.to_string()),
            Self::Float(value) => Err(value),
        }
    }
}

type RawRow = BTreeMap<String, Option<Cell>>;

/// Loads all rows from a row file.
///
/// Each row's source is `row N`, counting from 1.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed, or if a cell
/// holds an unquoted decimal.
pub fn load_rows(path: &Path) -> Result<Vec<Row>, RowsError> {
    let format = Format::from_path(path)?;
    let file = File::open(path).map_err(|io_error| match io_error.kind() {
        io::ErrorKind::NotFound => RowsError::NotFound(path.to_path_buf()),
        _ => RowsError::Io(io_error),
    })?;
    let reader = BufReader::new(file);

    let raw: Vec<RawRow> = match format {
        Format::Json => serde_json::from_reader(reader)?,
        Format::Yaml => serde_yaml::from_reader(reader)?,
    };

    let mut rows = Vec::with_capacity(raw.len());
    for (i, cells) in raw.into_iter().enumerate() {
        let mut row = Row::new(format!("row {}", i + 1));
        for (column, cell) in cells {
            let Some(cell) = cell else { continue };
            let text = cell.into_text().map_err(|value| RowsError::UnquotedDecimal {
                row: row.source.clone(),
                column: column.clone(),
                value,
            })?;
            row.cells.insert(column, text);
        }
        rows.push(row);
    }

    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Writes rows to a row file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn save_rows(path: &Path, rows: &[Row]) -> Result<(), RowsError> {
    #[derive(Serialize)]
    #[serde(transparent)]
    struct Cells<'a>(&'a BTreeMap<String, String>);

    let format = Format::from_path(path)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let cells: Vec<Cells<'_>> = rows.iter().map(|row| Cells(&row.cells)).collect();
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut writer, &cells)?;
            writer.write_all(b"\n")?;
        }
        Format::Yaml => serde_yaml::to_writer(&mut writer, &cells)?,
    }
    writer.flush()?;

    debug!("Saved {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;
    use test_case::test_case;

    use super::*;

    #[test_case("rows.json", Some(Format::Json); "json")]
    #[test_case("rows.YAML", Some(Format::Yaml); "uppercase yaml")]
    #[test_case("rows.yml", Some(Format::Yaml); "yml")]
    #[test_case("rows.xlsx", None; "spreadsheet")]
    #[test_case("rows", None; "no extension")]
    fn format_from_extension(name: &str, expected: Option<Format>) {
        assert_eq!(Format::from_path(Path::new(name)).ok(), expected);
    }

    #[test]
    fn loads_json_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rows.json");
        fs::write(
            &path,
            r#"[
                {"Artifact Type": "Heading", "section": "1", "Contents": "Intro"},
                {"Artifact Type": "Requirement", "section": "1-1", "Contents": null, "Page": 4}
            ]"#,
        )
        .unwrap();

        let rows = load_rows(&path).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source, "row 1");
        assert_eq!(rows[0].cell("Contents"), Some("Intro"));
        assert_eq!(rows[1].source, "row 2");
        assert_eq!(rows[1].cell("Contents"), None);
        assert_eq!(rows[1].cell("Page"), Some("4"));
    }

    #[test]
    fn loads_yaml_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rows.yaml");
        fs::write(
            &path,
            "- Artifact Type: Heading\n  section: '1.10'\n- Artifact Type: Requirement\n  section: 1.10-1\n  Approved: true\n",
        )
        .unwrap();

        let rows = load_rows(&path).unwrap();

        assert_eq!(rows[0].cell("section"), Some("1.10"));
        assert_eq!(rows[1].cell("section"), Some("1.10-1"));
        assert_eq!(rows[1].cell("Approved"), Some("true"));
    }

    #[test_case("rows.yaml", "- section: 1.10\n"; "yaml")]
    #[test_case("rows.json", r#"[{"section": 1.10}]"#; "json")]
    fn unquoted_decimal_section_is_rejected(name: &str, content: &str) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(name);
        fs::write(&path, content).unwrap();

        let error = load_rows(&path).unwrap_err();

        let RowsError::UnquotedDecimal { row, column, .. } = &error else {
            panic!("unexpected error: {error}");
        };
        assert_eq!(row, "row 1");
        assert_eq!(column, "section");
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let rows = vec![
            Row::new("row 1")
                .with_cell("section", "1")
                .with_cell("Artifact Type", "Heading"),
            Row::new("row 2")
                .with_cell("section", "1-1")
                .with_cell("Contents", "The system shall start."),
        ];

        for name in ["out/rows.json", "out/rows.yml"] {
            let path = tmp.path().join(name);
            save_rows(&path, &rows).unwrap();
            assert_eq!(load_rows(&path).unwrap(), rows);
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let error = load_rows(&tmp.path().join("missing.json")).unwrap_err();
        assert!(matches!(error, RowsError::NotFound(_)));
    }

    #[test]
    fn malformed_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rows.json");
        fs::write(&path, r#"{"section": "1"}"#).unwrap();

        let error = load_rows(&path).unwrap_err();
        assert!(matches!(error, RowsError::Json(_)));
    }
}
