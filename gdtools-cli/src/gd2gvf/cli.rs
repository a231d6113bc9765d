use clap::{Command, arg};

use crate::common::{output_arg, reference_arg};

pub const GD2GVF_CMD: &str = "gd2gvf";

pub fn create_gd2gvf_cli() -> Command {
    Command::new(GD2GVF_CMD)
        .about("Convert the mutations of a Genome Diff file to Genome Variation Format (GVF).")
        .arg_required_else_help(true)
        .arg(arg!(-i --input <input> "Genome Diff file to convert").required(true))
        .arg(output_arg("GVF output file"))
        .arg(reference_arg())
        .arg(arg!(--"snv-only" "Only write single nucleotide variants"))
}
