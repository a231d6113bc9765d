use clap::Command;

use crate::common::{config_arg, inputs_arg, output_arg, reference_arg};

pub const NORMALIZE_CMD: &str = "normalize";

pub fn create_normalize_cli() -> Command {
    Command::new(NORMALIZE_CMD)
        .about("Move indels to their canonical position and comment out mutations that change nothing.")
        .arg_required_else_help(true)
        .arg(inputs_arg("Genome Diff files to normalize"))
        .arg(reference_arg())
        .arg(output_arg("Normalized Genome Diff file"))
        .arg(config_arg())
}
