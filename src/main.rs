//! Command-line interface for rebuilding and renumbering document outlines.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
