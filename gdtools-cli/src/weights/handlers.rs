use anyhow::Result;
use clap::ArgMatches;

use gdtools_core::GenomeDiff;

use crate::common::{read_inputs, write_output};

pub fn run_weights(matches: &ArgMatches) -> Result<()> {
    let inputs = read_inputs(matches)?;
    let mut weighted = GenomeDiff::weights(&inputs)?;
    write_output(&mut weighted, matches)
}
