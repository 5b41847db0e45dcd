mod cli;
mod config;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Uniforms(args)) => run::print_uniforms(&cli.run, args.json),
        None => run::run(cli.run),
    }
}
