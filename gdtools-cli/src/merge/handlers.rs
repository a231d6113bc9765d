use anyhow::{Context, Result};
use clap::ArgMatches;

use gdtools_core::MergeOptions;

use crate::common::{read_inputs, write_output};

pub fn run_merge(matches: &ArgMatches) -> Result<()> {
    let options = MergeOptions {
        unique: matches.get_flag("unique"),
        reassign_ids: matches.get_flag("id"),
        phylogeny_aware: matches.get_flag("phylogeny-aware"),
    };

    let mut inputs = read_inputs(matches)?.into_iter();
    let mut merged = inputs.next().context("no input Genome Diff files given")?;
    for gd in inputs {
        merged.merge(&gd, &options)?;
    }
    if options.reassign_ids {
        merged.reassign_unique_ids()?;
    }
    write_output(&mut merged, matches)
}
