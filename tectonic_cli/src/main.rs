#![allow(missing_docs)]

use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::process::{ExitCode, Termination};
use tectonic_cli::{Opts, Subcommand};

fn main() -> ExitCode {
    let opts = Opts::parse();

    let level = if opts.configuration.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    match opts.subcommand.run(&opts.configuration) {
        Ok(code) => code,
        result @ Err(_) => result.report(),
    }
}
