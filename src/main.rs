//! Binary for aigsat

mod cmd;

use clap::Parser;

fn main() {
    let cli = cmd::Cli::parse();

    match cli.command {
        cmd::Commands::Solve(a) => a.run(),
        cmd::Commands::Show(a) => a.run(),
    }
}
