use anyhow::Result;
use clap::ArgMatches;

use gdtools_io::GvfWrite;

use crate::common::{load_references, read_genome_diff, required_str};

pub fn run_gd2gvf(matches: &ArgMatches) -> Result<()> {
    let gd = read_genome_diff(required_str(matches, "input")?)?;
    let refs = load_references(matches)?;
    let output = required_str(matches, "output")?;

    gd.write_gvf(output, &refs, matches.get_flag("snv-only"))?;
    eprintln!("Wrote GVF file {}", output);
    Ok(())
}
