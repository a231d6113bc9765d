use anyhow::{Result, bail};
use clap::ArgMatches;

use crate::common::{load_references, read_inputs};

pub fn run_validate(matches: &ArgMatches) -> Result<()> {
    let refs = load_references(matches)?;
    let mut failed = 0;
    for gd in read_inputs(matches)? {
        let name = gd
            .file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let report = gd.validation_report(&refs);
        if report.is_empty() {
            eprintln!("{}: OK", name);
            continue;
        }
        eprintln!("{}", report);
        if report.is_fatal() {
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} Genome Diff files failed validation", failed);
    }
    Ok(())
}
