use std::io;

use clap::Parser;

use texlipse::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    run(&cli, &mut io::stdout().lock())
}
