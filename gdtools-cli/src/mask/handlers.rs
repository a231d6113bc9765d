use anyhow::Result;
use clap::ArgMatches;

use crate::common::{load_settings, override_setting, read_genome_diff, required_str, write_output};

pub fn run_mask(matches: &ArgMatches) -> Result<()> {
    let mut settings = load_settings(matches)?;
    override_setting(matches, "small-size", &mut settings.mask_small_max_size);

    let mut gd = read_genome_diff(required_str(matches, "input")?)?;
    let mask_gd = read_genome_diff(required_str(matches, "mask")?)?;

    let before = gd.mutation_list().len();
    gd.mask_mutations(&mask_gd, matches.get_flag("small"), &settings)?;
    eprintln!("Masked {} mutations", before - gd.mutation_list().len());
    write_output(&mut gd, matches)
}
