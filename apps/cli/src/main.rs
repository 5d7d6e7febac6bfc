//! bookmarkprep CLI: distill bookmark exports and split them into batches.
//!
//! Reduces exported bookmark records to a compact canonical shape and
//! partitions the result into fixed-size files for categorization.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
