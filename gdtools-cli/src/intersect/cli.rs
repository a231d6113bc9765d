use clap::Command;

use crate::common::{inputs_arg, output_arg};

pub const INTERSECT_CMD: &str = "intersect";

pub fn create_intersect_cli() -> Command {
    Command::new(INTERSECT_CMD)
        .about("Keep the mutations found in every input Genome Diff file.")
        .arg_required_else_help(true)
        .arg(inputs_arg("Genome Diff files to intersect (at least two)").num_args(2..))
        .arg(output_arg("Genome Diff file of shared mutations"))
}
