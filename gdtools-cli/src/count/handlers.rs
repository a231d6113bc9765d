use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use clap::ArgMatches;

use gdtools_core::write_count_table;

use crate::common::{load_references, read_inputs, required_str};

pub fn run_count(matches: &ArgMatches) -> Result<()> {
    let refs = load_references(matches)?;
    let output = required_str(matches, "output")?;

    let counts = read_inputs(matches)?
        .iter()
        .map(|gd| gd.count_mutations(&refs))
        .collect::<Result<Vec<_>, _>>()?;

    let file = File::create(output).with_context(|| format!("Failed to create {}", output))?;
    let mut writer = BufWriter::new(file);
    write_count_table(&mut writer, &counts)?;
    writer.flush()?;

    eprintln!("Wrote counts for {} files to {}", counts.len(), output);
    Ok(())
}
