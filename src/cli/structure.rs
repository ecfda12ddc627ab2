use std::path::PathBuf;

use clap::Parser;
use outline::{load_rows, Config, Outline};
use tracing::instrument;

use super::terminal::{fit_to_width, terminal_width, Colorize};

#[derive(Debug, Parser)]
#[command(about = "Rebuild the outline tree from a row file and print it")]
pub struct Structure {
    /// Row file (.json, .yaml or .yml)
    file: PathBuf,

    /// Write the tree to this file instead of the terminal
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Structure {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let rows = load_rows(&self.file)?;
        let outline = Outline::from_rows(rows, config);
        let dump = outline.render();

        if let Some(output) = &self.output {
            std::fs::write(output, &dump)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", output.display()))?;
            println!(
                "{}",
                format!(
                    "Wrote outline of {} nodes to {}",
                    outline.tree().len(),
                    output.display()
                )
                .success()
            );
        } else {
            let width = terminal_width().map(usize::from);
            for line in dump.lines() {
                match width {
                    Some(width) => println!("{}", fit_to_width(line, width)),
                    None => println!("{line}"),
                }
            }
        }

        if !outline.skipped().is_empty() {
            println!();
            println!(
                "{}",
                format!("Skipped {} rows:", outline.skipped().len()).warning()
            );
            for skipped in outline.skipped() {
                println!(
                    "  {} '{}': {}",
                    skipped.source.dim(),
                    skipped.section,
                    skipped.error
                );
            }
        }

        for violation in outline.numbering().violations() {
            println!("{}", format!("Numbering incomplete: {violation}").warning());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn writes_tree_to_output_file() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("rows.json");
        fs::write(
            &file,
            r#"[
                {"Artifact Type": "Heading", "section": "1", "Contents": "Intro"},
                {"Artifact Type": "Requirement", "section": "1-1", "Contents": "Shall."},
                {"Artifact Type": "Requirement", "section": "x", "Contents": "Broken"}
            ]"#,
        )
        .unwrap();
        let output = tmp.path().join("tree.txt");

        Structure {
            file,
            output: Some(output.clone()),
        }
        .run(&Config::default())
        .unwrap();

        let dump = fs::read_to_string(output).unwrap();
        assert_eq!(
            dump,
            "Root\n└─ [1] Heading 1 Intro\n   └─ [1-1] Requirement 1-1 Shall.\n"
        );
    }

    #[test]
    fn missing_row_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let result = Structure {
            file: tmp.path().join("missing.json"),
            output: None,
        }
        .run(&Config::default());
        assert!(result.is_err());
    }
}
