use clap::{Command, arg};

use crate::common::{inputs_arg, output_arg, phylogeny_aware_arg};

pub const MERGE_CMD: &str = "merge";

pub fn create_merge_cli() -> Command {
    Command::new(MERGE_CMD)
        .about("Merge Genome Diff files. Ids already in use get new ones, and references to them are updated.")
        .arg_required_else_help(true)
        .arg(inputs_arg("Genome Diff files to merge"))
        .arg(output_arg("Merged Genome Diff file"))
        .arg(arg!(-u --unique "Keep only one copy of equal entries"))
        .arg(arg!(-i --id "Renumber all ids"))
        .arg(phylogeny_aware_arg())
}
