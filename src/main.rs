mod cli;
mod commands;
mod config;
mod export;
mod paths;
mod progress;
mod records;
mod stats;
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
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    log::debug!("verbosity {}", ctx.verbose);

    match cli.command {
        Command::Usage(args) => commands::usage::run(&ctx, args),
        Command::Directory(args) => commands::directory::run(&ctx, args),
        Command::SharedDrives(args) => commands::shared_drives::run(&ctx, args),
        Command::Mailbox(args) => commands::mailbox::run(&ctx, args),
        Command::Grant(args) => commands::grant::run(&ctx, args),
        Command::FindDrives(args) => commands::find_drives::run(&ctx, args),
        Command::DriveInfo(args) => commands::drive_info::run(&ctx, args),
        Command::Diagnose(args) => commands::diagnose::run(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "wsaudit", &mut io::stdout());
            Ok(())
        }
    }
}
