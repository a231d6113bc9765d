use clap::{Command, arg};

use crate::common::{output_arg, phylogeny_aware_arg};

pub const SUBTRACT_CMD: &str = "subtract";

pub fn create_subtract_cli() -> Command {
    Command::new(SUBTRACT_CMD)
        .about("Remove from the input every mutation found in any of the other Genome Diff files.")
        .arg_required_else_help(true)
        .arg(arg!(<input> "Genome Diff file to subtract from"))
        .arg(arg!(<minus> ... "Genome Diff files with the mutations to remove"))
        .arg(output_arg("Genome Diff file of remaining mutations"))
        .arg(phylogeny_aware_arg())
}
