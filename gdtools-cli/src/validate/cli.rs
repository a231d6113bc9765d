use clap::Command;

use crate::common::{inputs_arg, reference_arg};

pub const VALIDATE_CMD: &str = "validate";

pub fn create_validate_cli() -> Command {
    Command::new(VALIDATE_CMD)
        .about("Check that Genome Diff files are consistent with the reference sequences.")
        .arg_required_else_help(true)
        .arg(inputs_arg("Genome Diff files to check"))
        .arg(reference_arg())
}
