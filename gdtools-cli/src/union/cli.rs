use clap::{Command, arg};

use crate::common::{inputs_arg, output_arg, phylogeny_aware_arg};

pub const UNION_CMD: &str = "union";

pub fn create_union_cli() -> Command {
    Command::new(UNION_CMD)
        .about("Combine the mutations of every input Genome Diff file, keeping one copy of each.")
        .arg_required_else_help(true)
        .arg(inputs_arg("Genome Diff files to combine (at least two)").num_args(2..))
        .arg(output_arg("Genome Diff file of combined mutations"))
        .arg(arg!(-e --evidence "Combine evidence instead of mutations"))
        .arg(phylogeny_aware_arg())
}
