use std::path::{Path, PathBuf};

mod check;
mod export;
mod sanitize;
mod structure;
mod terminal;

use check::Check;
use clap::ArgAction;
use export::Export;
use outline::Config;
use sanitize::Sanitize;
use structure::Structure;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML file naming the row columns (defaults apply without one)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = load_config(self.config.as_deref())?;
        self.command.run(&config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let config = Config::load(path).map_err(|e| anyhow::anyhow!(e))?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// `<dir>/<stem>-<suffix>.<ext>`
fn derived_path(file: &Path, suffix: &str) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match file.extension() {
        Some(extension) => format!("{stem}-{suffix}.{}", extension.to_string_lossy()),
        None => format!("{stem}-{suffix}"),
    };
    file.with_file_name(name)
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Rebuild the outline tree and print it
    Structure(Structure),

    /// Rewrite the numbering column with canonical numbering
    ///
    /// The output goes to `<stem>-sanitized.<ext>` next to the input unless
    /// `--output` is given.
    Sanitize(Sanitize),

    /// Report numbering inconsistencies in the row sequence
    ///
    /// Exits with status 2 when diagnostics are found.
    Check(Check),

    /// Write the outline as a flat table with canonical numbering
    ///
    /// One row per node in document order, with `Type`, `Identifier`,
    /// `Title`, `Level`, `Chapter` and `Content` columns followed by the
    /// other columns of the source row.
    Export(Export),
}

impl Command {
    fn run(self, config: &Config) -> anyhow::Result<()> {
        match self {
            Self::Structure(command) => command.run(config)?,
            Self::Sanitize(command) => command.run(config)?,
            Self::Check(command) => command.run(config)?,
            Self::Export(command) => command.run(config)?,
        }
        Ok(())
    }
}
