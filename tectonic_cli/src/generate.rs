use super::{GlobalConfiguration, Subcommand};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueHint};
use signal_hook::consts::{SIGHUP, SIGINT};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tectonic::base::Base;
use tectonic::searcher::{BreadthSearcher, DepthSearcher};

/// Enumerate every complete grid of a base.
#[derive(Parser)]
#[command(disable_help_flag = true)]
pub struct Opts {
    /// Number of rows of the grids.
    #[arg(default_value_t = 5, short = 'h', value_name = "HEIGHT")]
    height: u8,
    /// Number of columns of the grids.
    #[arg(default_value_t = 4, short = 'l', value_name = "WIDTH")]
    width: u8,
    /// Highest value a cell may hold.
    #[arg(default_value_t = 5, short = 'm', value_name = "MAXIMUM")]
    maximum: u8,
    /// Produce a single stage, then stop.
    #[arg(short = 'q')]
    single_stage: bool,
    /// Do not enumerate past this stage.
    #[arg(short = 's', value_name = "STAGE")]
    max_stage: Option<usize>,
    /// Only restart from files of the exact same base.
    #[arg(long)]
    strict: bool,
    /// Keep only canonical representatives of the symmetry group.
    #[arg(long)]
    canonical: bool,
    /// Directory holding the enumeration files.
    #[arg(default_value = "data", value_hint = ValueHint::DirPath)]
    path: PathBuf,
    /// Print help.
    #[arg(action = ArgAction::Help, long)]
    help: Option<bool>,
}

impl Subcommand for Opts {
    fn run(&self, _: &GlobalConfiguration) -> Result<ExitCode> {
        let base = Base::new(self.height, self.width, self.maximum)?;

        if self.single_stage || self.max_stage.is_some() {
            // the stage-by-stage driver materialises every frontier and
            // knows how to restart from the files of a previous run
            let mut searcher = BreadthSearcher::new(base, &self.path);
            searcher.canonical = self.canonical;
            searcher.single_stage = self.single_stage;
            searcher.max_stage = self.max_stage;
            searcher.strict = self.strict;
            searcher.run().context("enumeration failed")?;
        } else {
            // the depth-first driver checkpoints itself when interrupted
            let stop = Arc::new(AtomicBool::new(false));
            for signal in [SIGHUP, SIGINT] {
                signal_hook::flag::register(signal, Arc::clone(&stop))
                    .context("unable to install the signal handlers")?;
            }

            let mut searcher = DepthSearcher::new(base, &self.path, stop);
            searcher.canonical = self.canonical;
            searcher.run().context("enumeration failed")?;
        }

        Ok(ExitCode::SUCCESS)
    }
}
