use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::common::{read_inputs, write_output};

pub fn run_intersect(matches: &ArgMatches) -> Result<()> {
    let mut inputs = read_inputs(matches)?.into_iter();
    let mut shared = inputs.next().context("no input Genome Diff files given")?;
    for gd in inputs {
        shared.intersect(&gd)?;
    }
    write_output(&mut shared, matches)
}
