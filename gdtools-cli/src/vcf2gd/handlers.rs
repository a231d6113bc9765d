use anyhow::{Context, Result};
use clap::ArgMatches;

use gdtools_io::read_vcf;

use crate::common::{required_str, write_output};

pub fn run_vcf2gd(matches: &ArgMatches) -> Result<()> {
    let input = required_str(matches, "input")?;
    let mut gd = read_vcf(input).with_context(|| format!("Failed to read VCF file {}", input))?;
    write_output(&mut gd, matches)
}
