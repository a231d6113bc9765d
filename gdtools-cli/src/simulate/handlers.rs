use anyhow::{Context, Result};
use clap::ArgMatches;

use gdtools_core::{GenomeDiff, SimulationRequest};

use crate::common::{load_references, load_settings, required_str, write_output};

pub fn run_simulate(matches: &ArgMatches) -> Result<()> {
    let settings = load_settings(matches)?;
    let request: SimulationRequest = required_str(matches, "type")?.parse()?;
    let count = *matches.get_one::<usize>("number").context("missing --number")?;
    let buffer = *matches.get_one::<i64>("buffer").context("missing --buffer")?;
    let seed = matches
        .get_one::<u64>("seed")
        .copied()
        .unwrap_or_else(rand::random::<u64>);
    log::info!("Simulating with seed {}", seed);

    let refs = load_references(matches)?;
    let mut gd = GenomeDiff::new();
    let added = gd.random_mutations(&request, count, buffer, &refs, seed, &settings)?;
    if added < count {
        eprintln!("Only {} of {} mutations could be placed", added, count);
    }

    gd.validate_with_reference(&refs)?;
    write_output(&mut gd, matches)
}
