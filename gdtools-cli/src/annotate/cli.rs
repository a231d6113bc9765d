use clap::{Command, arg};

use crate::common::{inputs_arg, output_arg, reference_arg};

pub const ANNOTATE_CMD: &str = "annotate";

pub fn create_annotate_cli() -> Command {
    Command::new(ANNOTATE_CMD)
        .about("Annotate mutations with the genes they overlap. Several inputs are merged first.")
        .arg_required_else_help(true)
        .arg(inputs_arg("Genome Diff files to annotate"))
        .arg(reference_arg())
        .arg(output_arg("Annotated Genome Diff file"))
        .arg(arg!(--"ignore-pseudogenes" "Do not annotate mutations with pseudogenes"))
}
