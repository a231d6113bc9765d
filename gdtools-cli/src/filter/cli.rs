use clap::{Command, arg};

use crate::common::output_arg;

pub const FILTER_CMD: &str = "filter";

pub fn create_filter_cli() -> Command {
    Command::new(FILTER_CMD)
        .about("Comment out mutations matching any filter expression, such as 'frequency < 0.5'.")
        .arg_required_else_help(true)
        .arg(arg!(-i --input <input> "Genome Diff file to filter").required(true))
        .arg(output_arg("Filtered Genome Diff file"))
        .arg(arg!(-m --"mut-type" <mut_type> "Comma-separated mutation types to filter (default: all)"))
        .arg(arg!(--region <region> "Also drop mutations outside seq_id:start-end"))
        .arg(arg!([filters] ... "Filter expressions of the form 'key OP value'"))
}
