use clap::{Command, arg};

use crate::common::{config_arg, i64_arg, output_arg};

pub const MASK_CMD: &str = "mask";

pub fn create_mask_cli() -> Command {
    Command::new(MASK_CMD)
        .about("Remove mutations inside the MASK and UN regions of a mask file and summarize evidence as UN regions.")
        .arg_required_else_help(true)
        .arg(arg!(<input> "Genome Diff file to mask"))
        .arg(arg!(<mask> "Genome Diff file with MASK or UN regions"))
        .arg(output_arg("Masked Genome Diff file"))
        .arg(arg!(-s --small "Only remove small mutations not tagged mediated or between"))
        .arg(i64_arg(arg!(--"small-size" <small_size> "Largest mutation counted as small")))
        .arg(config_arg())
}
