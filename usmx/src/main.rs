use clap::{ColorChoice, Parser};
use colored::Colorize;
use std::{
    io::{IsTerminal, stderr},
    process,
};
use usmx::{Args, Commands, Logger};

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    colored::control::set_override(match args.color {
        ColorChoice::Always => true,
        ColorChoice::Auto => stderr().is_terminal(),
        ColorChoice::Never => false,
    });
    Logger::init(args.log_level());

    match args.command {
        Commands::Extract(args) => args.execute()?,
        Commands::Keygen(args) => args.execute()?,
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".bold().red(), e);
        process::exit(1);
    }
}
