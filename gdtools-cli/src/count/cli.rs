use clap::{Command, arg};

use crate::common::{inputs_arg, reference_arg};

pub const COUNT_CMD: &str = "count";

pub fn create_count_cli() -> Command {
    Command::new(COUNT_CMD)
        .about("Count mutations by type and the bases they change, one row per input Genome Diff file.")
        .arg_required_else_help(true)
        .arg(inputs_arg("Genome Diff files to count"))
        .arg(reference_arg())
        .arg(arg!(-o --output <output> "Tab-separated count table").default_value("count.tsv"))
}
