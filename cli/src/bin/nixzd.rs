use std::process::ExitCode;

use clap::Parser;
use hiex_cli::nixzd::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    hiex_cli::init_logging(cli.common.verbose);
    hiex_cli::finish(nixzd::run(cli))
}
