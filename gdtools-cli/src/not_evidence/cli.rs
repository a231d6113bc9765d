use clap::{Command, arg};

use crate::common::output_arg;

pub const NOT_EVIDENCE_CMD: &str = "not-evidence";

pub fn create_not_evidence_cli() -> Command {
    Command::new(NOT_EVIDENCE_CMD)
        .about("Remove evidence that no mutation cites.")
        .arg_required_else_help(true)
        .arg(arg!(-g --genomediff <genomediff> "Genome Diff file to clean up").required(true))
        .arg(output_arg("Genome Diff file without unused evidence"))
        .arg(arg!(-i --id "Renumber all ids"))
}
