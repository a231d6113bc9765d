//! Arguments and file handling shared by every command.
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, arg, value_parser};
use indicatif::{ProgressBar, ProgressStyle};

use gdtools_core::{GenomeDiff, MergeOptions, Settings};
use gdtools_refseq::ReferenceSequences;

pub fn output_arg(about: &'static str) -> Arg {
    arg!(-o --output <output>).help(about).required(true)
}

pub fn reference_arg() -> Arg {
    arg!(-r --reference <reference> ... "FASTA or GFF3 reference sequence file (repeatable)")
        .required(true)
}

pub fn config_arg() -> Arg {
    arg!(-c --config <config> "TOML file with settings")
}

pub fn inputs_arg(about: &'static str) -> Arg {
    arg!(<inputs> ...).help(about)
}

pub fn phylogeny_aware_arg() -> Arg {
    arg!(--"phylogeny-aware" "Let phylogeny_id and population_id tell otherwise equal mutations apart")
}

pub fn i64_arg(arg: Arg) -> Arg {
    arg.value_parser(value_parser!(i64))
}

pub fn required_str<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("missing required argument: {}", id))
}

pub fn load_settings(matches: &ArgMatches) -> Result<Settings> {
    match matches.get_one::<String>("config") {
        Some(path) => Settings::try_from(Path::new(path))
            .with_context(|| format!("Failed to read settings from {}", path)),
        None => Ok(Settings::default()),
    }
}

/// Replace `target` with the value of an `i64` flag when it was given.
pub fn override_setting(matches: &ArgMatches, id: &str, target: &mut i64) {
    if let Some(value) = matches.get_one::<i64>(id) {
        *target = *value;
    }
}

pub fn load_references(matches: &ArgMatches) -> Result<ReferenceSequences> {
    let paths: Vec<&String> = matches
        .get_many::<String>("reference")
        .context("at least one reference file is required")?
        .collect();
    ReferenceSequences::from_paths(&paths).context("Failed to load reference sequences")
}

pub fn read_genome_diff(path: &str) -> Result<GenomeDiff> {
    GenomeDiff::read(path).with_context(|| format!("Failed to read Genome Diff file {}", path))
}

///
/// Read every input file, showing progress when there are several.
///
pub fn read_inputs(matches: &ArgMatches) -> Result<Vec<GenomeDiff>> {
    let paths: Vec<&String> = matches
        .get_many::<String>("inputs")
        .context("no input Genome Diff files given")?
        .collect();

    let pb = ProgressBar::new(paths.len() as u64);
    if paths.len() > 1 {
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({eta})")?
                .progress_chars("##-"),
        );
    } else {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        inputs.push(read_genome_diff(path)?);
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(inputs)
}

///
/// Merge all inputs into the first, keeping only one copy of equal mutations.
///
pub fn merge_inputs(inputs: Vec<GenomeDiff>) -> Result<GenomeDiff> {
    let mut inputs = inputs.into_iter();
    let mut merged = inputs.next().context("no input Genome Diff files given")?;
    for gd in inputs {
        merged.merge(&gd, &MergeOptions::default())?;
    }
    Ok(merged)
}

pub fn write_output(gd: &mut GenomeDiff, matches: &ArgMatches) -> Result<()> {
    let output = required_str(matches, "output")?;
    gd.write(output)
        .with_context(|| format!("Failed to write Genome Diff file {}", output))?;
    eprintln!("Wrote {} records to {}", gd.len(), output);
    Ok(())
}
