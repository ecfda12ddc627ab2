use std::path::PathBuf;

use clap::Parser;
use outline::{load_rows, save_rows, Config, Outline, Row};
use tracing::instrument;

use super::{derived_path, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Write the outline as a flat table with canonical numbering")]
pub struct Export {
    /// Row file (.json, .yaml or .yml)
    file: PathBuf,

    /// Where to write the table [default: <stem>-export.<ext>]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Export {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let rows = load_rows(&self.file)?;
        let outline = Outline::from_rows(rows, config);

        let records: Vec<Row> = outline.flatten().into_iter().map(Row::from).collect();
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| derived_path(&self.file, "export"));
        save_rows(&output, &records)?;

        println!(
            "{}",
            format!("Exported {} rows to {}", records.len(), output.display()).success()
        );
        if !outline.is_complete() {
            println!(
                "{}",
                format!(
                    "{} rows skipped, {} nodes without canonical numbering",
                    outline.skipped().len(),
                    outline.numbering().violations().len()
                )
                .warning()
            );
        }

        Ok(())
    }
}
