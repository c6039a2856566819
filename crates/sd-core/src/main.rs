//! sd-core binary entry point.

use clap::Parser;

use sd_core::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    run(cli).into()
}
