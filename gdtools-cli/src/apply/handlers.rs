use anyhow::{Result, anyhow};
use clap::ArgMatches;

use crate::common::{
    load_references, load_settings, override_setting, read_genome_diff, required_str,
};

pub fn run_apply(matches: &ArgMatches) -> Result<()> {
    let input = required_str(matches, "input")?;
    let output = required_str(matches, "output")?;
    let format = required_str(matches, "format")?;
    if !matches!(format, "fasta" | "gff3") {
        return Err(anyhow!(
            "Invalid output format: {}. Valid options are 'fasta' or 'gff3'",
            format
        ));
    }

    let mut settings = load_settings(matches)?;
    override_setting(matches, "slop-distance", &mut settings.slop_distance);

    let mut gd = read_genome_diff(input)?;
    let original = load_references(matches)?;
    let mut mutated = original.clone();

    let stats = gd.apply_to_sequences(&original, &mut mutated, &settings)?;
    eprintln!(
        "Applied {} mutations: {} bases changed, {} inserted, {} deleted",
        stats.counts.values().sum::<usize>(),
        stats.bases_changed,
        stats.bases_inserted,
        stats.bases_deleted
    );

    match format {
        "gff3" => mutated.write_gff3(output)?,
        _ => mutated.write_fasta(output)?,
    }
    eprintln!("Wrote mutated reference to {}", output);

    if let Some(gd_output) = matches.get_one::<String>("output-gd") {
        gd.write(gd_output)?;
    }
    Ok(())
}
