use clap::{Command, arg};

use crate::common::output_arg;

pub const VCF2GD_CMD: &str = "vcf2gd";

pub fn create_vcf2gd_cli() -> Command {
    Command::new(VCF2GD_CMD)
        .about("Convert the SNP and indel calls of a Variant Call Format (VCF) file to Genome Diff.")
        .arg_required_else_help(true)
        .arg(arg!(-i --input <input> "VCF file to convert").required(true))
        .arg(output_arg("Genome Diff output file"))
}
