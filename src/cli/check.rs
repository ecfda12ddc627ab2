use std::path::PathBuf;

use clap::Parser;
use outline::{load_rows, Config, ConsistencyReport, Outline};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Report numbering inconsistencies in a row file")]
pub struct Check {
    /// Row file (.json, .yaml or .yml)
    file: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Only list diagnostics, without the level change and level tables
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Check {
    #[instrument(level = "debug", skip(config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let rows = load_rows(&self.file)?;
        let outline = Outline::from_rows(rows, config);
        let report = outline.report();

        match self.output {
            OutputFormat::Table => self.output_table(report),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        }

        if !report.is_clean() {
            std::process::exit(2);
        }
        Ok(())
    }

    fn output_table(&self, report: &ConsistencyReport) {
        if !self.quiet {
            println!("Level changes");
            println!("{}", "─────────────".dim());
            println!(
                "{:<12} {:<13} {:<6} {:<12} {:<13} {:<6} {}",
                "Section", "Type", "Level", "Next", "Type", "Level", "Δ"
            );
            for transition in &report.transitions {
                let delta = format!("{:+}", transition.delta);
                let delta = if transition.delta > 1 {
                    delta.warning()
                } else {
                    delta
                };
                println!(
                    "{:<12} {:<13} {:<6} {:<12} {:<13} {:<6} {delta}",
                    transition.current.address,
                    transition.current.kind.as_str(),
                    transition.current.level,
                    transition.next.address,
                    transition.next.kind.as_str(),
                    transition.next.level,
                );
            }
            println!();

            println!("Levels");
            println!("{}", "──────".dim());
            println!("{:<6} {:<6} First", "Level", "Count");
            for summary in &report.levels {
                println!(
                    "{:<6} {:<6} {}",
                    summary.level,
                    summary.count,
                    summary.sample.title.dim()
                );
            }
            let gaps = report.gaps();
            if !gaps.is_empty() {
                let gaps: Vec<_> = gaps.iter().map(ToString::to_string).collect();
                println!(
                    "{}",
                    format!("Unused levels: {}", gaps.join(", ")).warning()
                );
            }
            println!();
        }

        if report.is_clean() {
            println!("{}", "Numbering is consistent (0 diagnostics)".success());
        } else {
            println!(
                "{}",
                format!("{} diagnostics:", report.diagnostics.len()).warning()
            );
            for diagnostic in &report.diagnostics {
                println!("  {:<10} {diagnostic}", diagnostic.source().dim());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn consistent_file_passes() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("rows.yaml");
        fs::write(
            &file,
            "- {Artifact Type: Heading, section: '1'}\n- {Artifact Type: Requirement, section: 1-1}\n",
        )
        .unwrap();

        for output in [OutputFormat::Table, OutputFormat::Json] {
            Check {
                file: file.clone(),
                output,
                quiet: false,
            }
            .run(&Config::default())
            .unwrap();
        }
    }

    #[test]
    fn unsupported_file_is_an_error() {
        let result = Check {
            file: PathBuf::from("rows.xlsx"),
            output: OutputFormat::Table,
            quiet: true,
        }
        .run(&Config::default());
        assert!(result.is_err());
    }
}
