mod cli;
mod commands;
mod config;
mod data_source;
mod provider;
mod resource;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity; stdout carries the plugin protocol
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    log::debug!("Verbosity {}", ctx.verbose);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => commands::serve::run(&ctx),
        Command::Schema(args) => commands::schema::run(&ctx, args),
        Command::Check(args) => commands::check::run(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "terraform-provider-waypoint", &mut io::stdout());
            Ok(())
        }
    }
}
