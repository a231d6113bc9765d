use anyhow::Result;
use clap::ArgMatches;

use crate::common::{read_genome_diff, required_str, write_output};

pub fn run_not_evidence(matches: &ArgMatches) -> Result<()> {
    let mut gd = read_genome_diff(required_str(matches, "genomediff")?)?;

    let before = gd.len();
    gd.filter_not_used_as_evidence();
    eprintln!("Removed {} unused evidence records", before - gd.len());

    if matches.get_flag("id") {
        gd.reassign_unique_ids()?;
    }
    write_output(&mut gd, matches)
}
