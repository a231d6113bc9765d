use anyhow::Result;
use clap::ArgMatches;

use crate::common::{load_references, load_settings, merge_inputs, read_inputs, write_output};

pub fn run_normalize(matches: &ArgMatches) -> Result<()> {
    let settings = load_settings(matches)?;
    let refs = load_references(matches)?;
    let mut gd = merge_inputs(read_inputs(matches)?)?;

    gd.normalize_mutations(&refs, &settings)?;
    let removed = gd.comment_out_not_valid();
    if removed > 0 {
        eprintln!("Commented out {} mutations identical to the reference", removed);
    }
    write_output(&mut gd, matches)
}
