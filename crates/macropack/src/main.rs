use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use macropack::app::pipeline::{self, BuildOptions};

/// Generate wrapper macros, splice snippets, and concatenate the macro library.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root of the macro library
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Configuration overlay (defaults to <root>/macropack.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail if any generated file is out of date instead of writing
    #[arg(long)]
    check: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    macropack::init(cli.verbose);

    pipeline::run(&BuildOptions {
        root: cli.root,
        config_path: cli.config,
        check: cli.check,
    })?;
    Ok(())
}
