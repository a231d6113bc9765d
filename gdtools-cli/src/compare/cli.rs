use clap::{Command, arg};

use crate::common::output_arg;

pub const COMPARE_CMD: &str = "compare";

pub fn create_compare_cli() -> Command {
    Command::new(COMPARE_CMD)
        .about("Label the mutations of a test Genome Diff as true-positive, false-negative or false-positive against a control.")
        .arg_required_else_help(true)
        .arg(arg!(<control> "Genome Diff file with the expected mutations"))
        .arg(arg!(<test> "Genome Diff file with the predicted mutations"))
        .arg(output_arg("Genome Diff file with a compare field on every mutation"))
}
