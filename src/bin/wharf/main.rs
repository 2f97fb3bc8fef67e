//! Wharf CLI - dependency manager for embedded firmware components

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wharf::InternalError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        let code = if e.chain().any(|c| c.downcast_ref::<InternalError>().is_some()) {
            2
        } else {
            1
        };
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("wharf=debug")
    } else {
        EnvFilter::new("wharf=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Schema => commands::schema::execute(),
        Commands::Cache(args) => commands::cache::execute(args),
    }
}
