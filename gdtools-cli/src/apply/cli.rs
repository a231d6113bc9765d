use clap::{Command, arg};

use crate::common::{config_arg, i64_arg, output_arg, reference_arg};

pub const APPLY_CMD: &str = "apply";

pub fn create_apply_cli() -> Command {
    Command::new(APPLY_CMD)
        .about("Apply mutations in a Genome Diff file to the reference sequences.")
        .arg_required_else_help(true)
        .arg(arg!(<input> "Genome Diff file with the mutations to apply"))
        .arg(reference_arg())
        .arg(output_arg("Mutated reference sequence file"))
        .arg(arg!(-f --format <format> "Output format (fasta or gff3)").default_value("fasta"))
        .arg(arg!(--"output-gd" <output_gd> "Also write the Genome Diff with apply statistics"))
        .arg(i64_arg(arg!(--"slop-distance" <slop_distance> "Distance from a repeat still counted as next to it")))
        .arg(config_arg())
}
