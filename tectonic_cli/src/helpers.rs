use anyhow::{Context, Result};
use num_bigint::BigUint;
use prettytable::Table;
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};
use std::path::Path;
use tectonic::stream::{self, Reader};

pub fn open_stream(input: &Path) -> Result<Reader> {
    stream::open(input).context(format!("unable to read '{}'", input.display()))
}

pub fn parse_code(text: &str) -> Result<BigUint> {
    text.parse()
        .ok()
        .context(format!("invalid code '{text}'"))
}

pub fn create_table() -> Table {
    let mut table = Table::new();
    table.set_format(
        FormatBuilder::new()
            .column_separator(' ')
            .separator(LinePosition::Title, LineSeparator::new('-', '+', ' ', ' '))
            .build(),
    );
    table
}
