mod commands;
mod config;
mod logging;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{build, BuildArgs};

/// Facade - compile pug templates and stylus sheets into script modules
#[derive(Parser, Debug)]
#[command(name = "facade")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build templates and stylesheets, optionally watching for changes
    Build(BuildArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Build(args) => build(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
