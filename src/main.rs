//! Indizar CLI — recipe-graph index build planning.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "indizar",
    version,
    about = "Recipe-graph index build planner — declarative artifacts, backtracking plans, BLAKE3-addressed intermediates"
)]
struct Cli {
    #[command(subcommand)]
    command: indizar::cli::Commands,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = indizar::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
