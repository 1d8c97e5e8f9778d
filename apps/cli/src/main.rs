//! apidoc CLI: render .NET API documentation to Markdown.
//!
//! Reads metadata graphs and XML documentation files and writes one
//! Markdown page per type plus an index per assembly.

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
