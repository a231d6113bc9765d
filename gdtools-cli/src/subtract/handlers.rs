use anyhow::Result;
use clap::ArgMatches;

use crate::common::{read_genome_diff, required_str, write_output};

pub fn run_subtract(matches: &ArgMatches) -> Result<()> {
    let phylogeny_aware = matches.get_flag("phylogeny-aware");
    let mut gd = read_genome_diff(required_str(matches, "input")?)?;

    for path in matches.get_many::<String>("minus").unwrap_or_default() {
        let minus = read_genome_diff(path)?;
        let before = gd.mutation_list().len();
        gd.subtract(&minus, phylogeny_aware)?;
        log::info!(
            "Subtracted {} mutations found in {}",
            before - gd.mutation_list().len(),
            path
        );
    }
    write_output(&mut gd, matches)
}
