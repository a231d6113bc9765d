use anyhow::Result;
use clap::ArgMatches;

use gdtools_core::GenomeDiff;

use crate::common::{read_genome_diff, required_str, write_output};

pub fn run_compare(matches: &ArgMatches) -> Result<()> {
    let control = read_genome_diff(required_str(matches, "control")?)?;
    let test = read_genome_diff(required_str(matches, "test")?)?;

    let mut compared = GenomeDiff::check(&control, &test)?;
    if let Some(summary) = compared.metadata.extension("TP|FN|FP") {
        eprintln!("TP|FN|FP\t{}", summary);
    }
    write_output(&mut compared, matches)
}
