use anyhow::{Result, bail};
use clap::ArgMatches;

use gdtools_core::{Filter, Kind};

use crate::common::{read_genome_diff, required_str, write_output};

pub fn run_filter(matches: &ArgMatches) -> Result<()> {
    let mut gd = read_genome_diff(required_str(matches, "input")?)?;

    let filters = matches
        .get_many::<String>("filters")
        .unwrap_or_default()
        .map(|f| f.parse::<Filter>())
        .collect::<Result<Vec<Filter>, _>>()?;
    let region = matches.get_one::<String>("region");
    if filters.is_empty() && region.is_none() {
        bail!("No filters given. Provide filter expressions or --region.");
    }

    let kinds = matches
        .get_one::<String>("mut-type")
        .map(|t| Kind::parse_list(t))
        .transpose()?;

    if let Some(region) = region {
        gd.filter_to_within_region(region)?;
    }
    if !filters.is_empty() {
        let filtered = gd.filter_mutations(&filters, kinds.as_deref());
        eprintln!("Filtered {} mutations", filtered);
    }
    write_output(&mut gd, matches)
}
