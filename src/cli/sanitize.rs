use std::path::PathBuf;

use clap::Parser;
use outline::{load_rows, save_rows, Config, Outline};
use tracing::instrument;

use super::{derived_path, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Rewrite the numbering column of a row file with canonical numbering")]
pub struct Sanitize {
    /// Row file (.json, .yaml or .yml)
    file: PathBuf,

    /// Where to write the patched rows [default: <stem>-sanitized.<ext>]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Column that receives the canonical numbering [default: the configured
    /// numbering column]
    #[arg(long, value_name = "NAME")]
    column: Option<String>,

    /// Show the changes without writing anything
    #[arg(long)]
    dry_run: bool,
}

impl Sanitize {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut config = config.clone();
        if let Some(column) = &self.column {
            config.set_numbering_field(column.clone());
        }

        let mut rows = load_rows(&self.file)?;
        let outline = Outline::from_rows(rows.clone(), &config);

        if !outline.numbering().is_complete() {
            for violation in outline.numbering().violations() {
                println!("{}", format!("Numbering incomplete: {violation}").warning());
            }
        }

        if self.dry_run {
            let patches = outline.patches();
            if patches.is_empty() {
                println!("{}", "Numbering is already canonical".success());
            }
            for patch in patches {
                println!(
                    "{:<10} {} -> {}",
                    patch.source.dim(),
                    patch.section,
                    patch.numbering.info()
                );
            }
            return Ok(());
        }

        let changed = outline.sanitize(&mut rows, &config);
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| derived_path(&self.file, "sanitized"));
        save_rows(&output, &rows)?;

        println!(
            "{}",
            format!(
                "Patched {changed} '{}' cells, wrote {}",
                config.numbering_field(),
                output.display()
            )
            .success()
        );
        if !outline.skipped().is_empty() {
            println!(
                "{}",
                format!(
                    "{} skipped rows were left unchanged",
                    outline.skipped().len()
                )
                .warning()
            );
        }

        Ok(())
    }
}
