use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::common::{read_inputs, write_output};

pub fn run_union(matches: &ArgMatches) -> Result<()> {
    let evidence_mode = matches.get_flag("evidence");
    let phylogeny_aware = matches.get_flag("phylogeny-aware");

    let mut inputs = read_inputs(matches)?.into_iter();
    let mut combined = inputs.next().context("no input Genome Diff files given")?;
    for gd in inputs {
        combined.union(&gd, evidence_mode, phylogeny_aware)?;
    }
    write_output(&mut combined, matches)
}
