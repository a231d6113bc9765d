use anyhow::Result;
use clap::ArgMatches;

use crate::common::{load_references, merge_inputs, read_inputs, write_output};

pub fn run_annotate(matches: &ArgMatches) -> Result<()> {
    let refs = load_references(matches)?;
    let mut gd = merge_inputs(read_inputs(matches)?)?;

    gd.annotate_mutations(&refs, matches.get_flag("ignore-pseudogenes"))?;
    write_output(&mut gd, matches)
}
