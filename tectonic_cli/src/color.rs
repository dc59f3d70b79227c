use super::helpers;
use super::{GlobalConfiguration, Subcommand};
use anyhow::Result;
use clap::{Parser, ValueHint};
use log::debug;
use num_bigint::BigUint;
use std::path::PathBuf;
use std::process::ExitCode;
use tectonic::{codec, coloring};

/// Print the codes whose region graph admits no four-colouring.
#[derive(Parser)]
pub struct Opts {
    /// Stream of codes to check.
    #[arg(long, short, value_hint = ValueHint::FilePath)]
    file: Option<PathBuf>,
    /// Codes to check, in decimal.
    #[arg(value_name = "CODE")]
    codes: Vec<String>,
}

fn report(code: &BigUint) -> Result<()> {
    let grid = codec::decode(code)?;
    if !coloring::is_four_colorable(&grid) {
        debug!("\n{grid}");
        println!("{code}");
    }
    Ok(())
}

impl Subcommand for Opts {
    fn run(&self, _: &GlobalConfiguration) -> Result<ExitCode> {
        for text in &self.codes {
            report(&helpers::parse_code(text)?)?;
        }

        if let Some(path) = &self.file {
            for code in helpers::open_stream(path)? {
                report(&code?)?;
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
