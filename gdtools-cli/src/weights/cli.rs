use clap::Command;

use crate::common::{inputs_arg, output_arg};

pub const WEIGHTS_CMD: &str = "weights";

pub fn create_weights_cli() -> Command {
    Command::new(WEIGHTS_CMD)
        .about("Pool the mutations of every input. Repeated mutations are kept once with weight = 1/occurrences.")
        .arg_required_else_help(true)
        .arg(inputs_arg("Genome Diff files to pool"))
        .arg(output_arg("Genome Diff file of weighted mutations"))
}
