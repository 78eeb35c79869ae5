use anyhow::Result;
use clap::Parser;

use sipconv::{app, cli};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    app::run(cli)
}
