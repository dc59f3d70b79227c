use super::{GlobalConfiguration, Subcommand};
use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use tectonic::stream;

/// Rewrite a binary stream as a single aggregated segment.
#[derive(Parser)]
pub struct Opts {
    /// Path to the input stream.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
    /// Path of the rewritten stream; the input with an additional `.out`
    /// extension when left out.
    #[arg(long, short, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

impl Subcommand for Opts {
    fn run(&self, _: &GlobalConfiguration) -> Result<ExitCode> {
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.out", self.input.display())));

        let before = stream::map_segments(&self.input)
            .context(format!("unable to map '{}'", self.input.display()))?
            .len();
        stream::compact(&self.input, &output)
            .context(format!("unable to compact '{}'", self.input.display()))?;
        let after = stream::map_segments(&output)?.len();

        info!(
            "{} segment(s) compacted into {} in \u{ab}{}\u{bb}",
            before,
            after,
            output.display()
        );

        Ok(ExitCode::SUCCESS)
    }
}
