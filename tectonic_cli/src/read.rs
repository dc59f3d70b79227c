use super::helpers;
use super::{GlobalConfiguration, Subcommand};
use anyhow::{Context, Result};
use clap::{Args, Parser, ValueHint};
use prettytable::{Row, cell, row};
use std::path::PathBuf;
use std::process::ExitCode;
use tectonic::codec;
use tectonic::stream;

#[derive(Args)]
#[group(multiple = false)]
struct Group {
    /// Show the segment structure of a binary stream.
    #[arg(long)]
    blocks: bool,
    /// Print the decimal code of every grid.
    #[arg(long)]
    codes: bool,
    /// Pretty-print every grid.
    #[arg(long)]
    grids: bool,
    /// Print the codes whose grid is not in normal form.
    #[arg(long)]
    normal: bool,
}

/// Read out information of a stream of codes.
#[derive(Parser)]
pub struct Opts {
    /// Path to the input stream.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
    #[command(flatten)]
    group: Group,
}

impl Subcommand for Opts {
    fn run(&self, _: &GlobalConfiguration) -> Result<ExitCode> {
        if self.group.blocks {
            let segments = stream::map_segments(&self.input)
                .context(format!("unable to map '{}'", self.input.display()))?;

            let mut table = helpers::create_table();
            table.set_titles(row![c => "segment", "offset", "width", "codes"]);
            for (index, segment) in segments.iter().enumerate() {
                for &(width, count) in &segment.pairs {
                    let row = table.add_empty_row();
                    row.add_cell(cell!(index.to_string()));
                    row.add_cell(cell!(r->format!("{:#010x}", segment.offset)));
                    row.add_cell(cell!(r->width.to_string()));
                    row.add_cell(cell!(r->count.to_string()));
                }
            }
            table.printstd();

            return Ok(ExitCode::SUCCESS);
        }

        let reader = helpers::open_stream(&self.input)?;

        if self.group.codes {
            for code in reader {
                println!("{}", code?);
            }
        } else if self.group.grids {
            for code in reader {
                let grid = codec::decode(&code?)?;
                println!("{grid}");
                println!();
            }
        } else if self.group.normal {
            for code in reader {
                let code = code?;
                if !codec::decode(&code)?.is_normal() {
                    println!("{code}");
                }
            }
        } else {
            let base = reader.base();

            let mut table = helpers::create_table();
            table.set_titles(Row::new(vec![cell!(c->"property"), cell!(c->"value")]));
            table.add_row(row![r->"height", r->base.height]);
            table.add_row(row![r->"width", r->base.width]);
            table.add_row(row![r->"maximum", r->base.maximum]);
            table.add_row(row![r->"codes", r->reader.nb_codes()]);
            table.printstd();
        }

        Ok(ExitCode::SUCCESS)
    }
}
